use crate::types::Question;
use redis::{AsyncCommands, RedisResult};

/// Question store semantics. The execution core only reads from here;
/// the CLI `seed` command is the only writer.

pub const QUESTION_PREFIX: &str = "clash:question";
pub const QUESTION_INDEX: &str = "clash:questions";

/// Deterministic key for a question record
pub fn question_key(question_id: &str) -> String {
    format!("{}:{}", QUESTION_PREFIX, question_id)
}

/// Store a question and add it to the index set
pub async fn store_question(
    conn: &mut redis::aio::ConnectionManager,
    question: &Question,
) -> RedisResult<()> {
    let payload = serde_json::to_string(question)
        .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, "serialization error", e.to_string())))?;

    let _: () = conn.set(question_key(&question.id), payload).await?;
    let _: () = conn.sadd(QUESTION_INDEX, &question.id).await?;
    Ok(())
}

/// Fetch a question (with its test cases) by id
pub async fn fetch_question(
    conn: &mut redis::aio::ConnectionManager,
    question_id: &str,
) -> RedisResult<Option<Question>> {
    let payload: Option<String> = conn.get(question_key(question_id)).await?;

    match payload {
        Some(data) => {
            let question: Question = serde_json::from_str(&data)
                .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, "deserialization error", e.to_string())))?;
            Ok(Some(question))
        }
        None => Ok(None),
    }
}

/// All stored question ids, sorted
pub async fn list_question_ids(conn: &mut redis::aio::ConnectionManager) -> RedisResult<Vec<String>> {
    let mut ids: Vec<String> = conn.smembers(QUESTION_INDEX).await?;
    ids.sort();
    Ok(ids)
}
