use std::any::Any;

use dagforge_core::{validators, Attribute, ConfigError, ConfigValidator};

use crate::io::{DeclaredIo, IoKind};

/// Object-store location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Io {
    region_name: Option<String>,
    s3_protocol: String,
    bucket: String,
    path: String,
}

impl S3Io {
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    pub fn protocol(&self) -> &str {
        &self.s3_protocol
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn location(&self) -> String {
        if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("{}/{}", self.bucket, self.path)
        }
    }
}

impl IoKind for S3Io {
    fn alias(&self) -> String {
        format!("s3://{}/{}", self.region_name.as_deref().unwrap_or(""), self.location())
    }

    fn rendered_name(&self) -> String {
        format!("{}://{}", self.s3_protocol, self.location())
    }

    fn external_name(&self) -> String {
        let location = self.location().replace('/', "-");
        super::external_name("s3", &[self.region_name.as_deref(), Some(&location)])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DeclaredIo for S3Io {
    const KIND: &'static str = "s3";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::new("region_name")
                .optional()
                .validator(validators::string)
                .help("Only needed for cross region buckets"),
            Attribute::new("s3_protocol")
                .default_value("s3")
                .validator(validators::string)
                .help("s3, s3a or s3n"),
            Attribute::new("bucket").validator(validators::string),
            Attribute::new("path").validator(validators::string),
        ]
    }

    fn from_config(config: &ConfigValidator) -> Result<Self, ConfigError> {
        Ok(Self {
            region_name: config.get_str("region_name")?,
            s3_protocol: config.require_str("s3_protocol")?,
            bucket: normalize_path(&config.require_str("bucket")?),
            path: normalize_path(&config.require_str("path")?),
        })
    }
}

/// Lexical path normalisation: collapses repeated separators, `.` segments and
/// `..` segments, and drops a trailing separator
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{IoContext, IoModel};
    use serde_json::{json, Value};

    fn base_config() -> Value {
        json!({
            "type": "s3",
            "name": "events",
            "region_name": "eu_west_1",
            "bucket": "test_bucket",
            "path": "test_path/",
        })
    }

    fn build(raw: &Value) -> IoModel {
        IoModel::build::<S3Io>(raw, &IoContext::new("/")).unwrap()
    }

    #[test]
    fn names() {
        let io = build(&base_config());

        assert_eq!(io.alias(), "s3://eu_west_1/test_bucket/test_path");
        assert_eq!(io.rendered_name(), "s3://test_bucket/test_path");
        assert_eq!(io.external_name(), "s3-eu_west_1-test_bucket-test_path");
    }

    #[test]
    fn protocol_only_changes_rendered_name() {
        let mut raw = base_config();
        raw["s3_protocol"] = json!("s3a");
        let io = build(&raw);

        assert_eq!(io.alias(), "s3://eu_west_1/test_bucket/test_path");
        assert_eq!(io.rendered_name(), "s3a://test_bucket/test_path");
    }

    #[test]
    fn without_region() {
        let mut raw = base_config();
        raw.as_object_mut().unwrap().remove("region_name");
        let io = build(&raw);

        assert_eq!(io.alias(), "s3:///test_bucket/test_path");
        assert_eq!(io.external_name(), "s3-test_bucket-test_path");
        assert_eq!(io.downcast_ref::<S3Io>().unwrap().region_name(), None);
    }

    #[test]
    fn path_normalisation() {
        assert_eq!(normalize_path("a//b/./c/"), "a/b/c");
        assert_eq!(normalize_path("a/b/../c"), "a/c");
        assert_eq!(normalize_path("/a/../../b"), "/b");
        assert_eq!(normalize_path("../x"), "../x");
        assert_eq!(normalize_path(""), ".");
    }
}
