//! Built-in IO kinds

mod athena;
mod databricks;
mod dummy;
mod dynamo;
mod s3;
mod sns;

pub use athena::AthenaIo;
pub use databricks::DatabricksIo;
pub use dummy::DummyIo;
pub use dynamo::DynamoIo;
pub use s3::{normalize_path, S3Io};
pub use sns::SnsIo;

/// `account:region:name`, or just `name` when neither scope is set
fn scoped_rendered_name(account: Option<&str>, region: Option<&str>, name: &str) -> String {
    if account.is_none() && region.is_none() {
        name.to_string()
    } else {
        [account.unwrap_or(""), region.unwrap_or(""), name].join(":")
    }
}

/// `{prefix}-` followed by the non-empty parts joined with `-`
fn external_name(prefix: &str, parts: &[Option<&str>]) -> String {
    let joined: Vec<&str> = parts
        .iter()
        .flatten()
        .copied()
        .filter(|part| !part.is_empty())
        .collect();
    format!("{}-{}", prefix, joined.join("-"))
}
