//! 🔔 Storage notifications: the doorbell that starts every invocation.
//!
//! Object storage rings us with a JSON envelope that says "a new object landed".
//! The envelope is enormous. We read two fields out of it: the bucket name and
//! the object key. The rest is decoration.
//!
//! ⚠️ Keys arrive URL-encoded, with spaces rendered as `+`. A key named
//! `claims/my photo.txt` shows up as `claims/my+photo.txt`. We map `+` back to a
//! space BEFORE percent-decoding, so a literal plus (sent as `%2B`) survives.

use std::fmt;

use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::warn;

/// 📬 The notification envelope, trimmed to what we actually read.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    /// 🔣 Still URL-encoded. Use [`StorageNotification::object_location`] to get the real key.
    pub key: String,
}

/// 🗺️ Where the batch payload lives: a bucket and a decoded key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// 🏗️ Build a location from an already-decoded key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl StorageNotification {
    /// 📥 Parse a notification envelope from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .context("💀 The storage notification is not the JSON shape we expected (Records[].s3.bucket.name / Records[].s3.object.key).")
    }

    /// 🗺️ Pull the bucket + decoded key out of the first record.
    ///
    /// Only the first record is consumed. If the envelope carries more, they are
    /// logged and left alone.
    pub fn object_location(&self) -> Result<ObjectLocation> {
        let the_first_record = self.records.first().context(
            "💀 The storage notification has no Records. Somebody rang the doorbell and ran.",
        )?;

        if self.records.len() > 1 {
            warn!(
                "🔔 Notification carried {} records; only the first one is processed",
                self.records.len()
            );
        }

        let the_key = decode_object_key(&the_first_record.s3.object.key)?;
        Ok(ObjectLocation {
            bucket: the_first_record.s3.bucket.name.clone(),
            key: the_key,
        })
    }
}

/// 🔣 `+` → space, then percent-decode as UTF-8.
pub fn decode_object_key(raw_key: &str) -> Result<String> {
    let the_plus_free_key = raw_key.replace('+', " ");
    let the_decoded = percent_decode_str(&the_plus_free_key)
        .decode_utf8()
        .with_context(|| {
            format!("💀 Object key '{raw_key}' does not percent-decode to valid UTF-8")
        })?;
    Ok(the_decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const THE_SAMPLE_NOTIFICATION: &str = r#"{
        "Records": [
            {
                "eventVersion": "2.0",
                "eventSource": "aws:s3",
                "awsRegion": "eu-west-1",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "firehose-delivery",
                    "bucket": {
                        "name": "claims-events",
                        "arn": "arn:aws:s3:::claims-events"
                    },
                    "object": {
                        "key": "2017/06/01/12/claims+stream%3A1-2017-06-01.txt",
                        "size": 1024
                    }
                }
            }
        ]
    }"#;

    #[test]
    fn the_one_where_the_doorbell_tells_us_bucket_and_key() {
        let the_notification =
            StorageNotification::from_json(THE_SAMPLE_NOTIFICATION)
                .expect("💀 sample should parse");
        let the_location = the_notification
            .object_location()
            .expect("💀 location should resolve");

        assert_eq!(the_location.bucket, "claims-events");
        assert_eq!(the_location.key, "2017/06/01/12/claims stream:1-2017-06-01.txt");
    }

    #[test]
    fn the_one_where_plus_becomes_space_but_encoded_plus_stays_plus() {
        assert_eq!(decode_object_key("a+b%2Bc").expect("💀 decodes"), "a b+c");
    }

    #[test]
    fn the_one_where_unicode_keys_come_home() {
        assert_eq!(
            decode_object_key("fotos/%C3%B1and%C3%BA.txt").expect("💀 decodes"),
            "fotos/ñandú.txt"
        );
    }

    #[test]
    fn the_one_where_invalid_utf8_in_a_key_is_an_error() {
        assert!(decode_object_key("bad%FF%FEkey").is_err());
    }

    #[test]
    fn the_one_where_an_empty_envelope_is_fatal() {
        let the_notification =
            StorageNotification::from_json(r#"{"Records": []}"#)
                .expect("💀 empty list still parses");
        assert!(the_notification.object_location().is_err());
    }

    #[test]
    fn the_one_where_a_missing_records_field_is_also_empty() {
        let the_notification =
            StorageNotification::from_json("{}").expect("💀 defaults to empty");
        assert!(the_notification.records.is_empty());
        assert!(the_notification.object_location().is_err());
    }

    #[test]
    fn the_one_where_display_looks_like_an_s3_uri() {
        assert_eq!(
            ObjectLocation::new("bucket", "key/file.txt").to_string(),
            "s3://bucket/key/file.txt"
        );
    }
}
