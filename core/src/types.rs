//! Wire DTOs for the Clarifai v1 API.
//!
//! # Design
//! Request types serialize exactly the fields the service expects and omit
//! empty optionals. Response types are lenient: every field has a default, so
//! a body that leaves a field out still decodes. A field with the wrong JSON
//! type, or a body that is not JSON at all, is still a decode error.
//!
//! Image and video tag results share their envelope and per-item fields; they
//! differ only in the tag payload, so the envelope is generic over it
//! (`TagResponse<ImageTag>` / `TagResponse<VideoTag>`).

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, ParseBigIntError};
use serde::ser::Error as _;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// `status_code` value the service uses for success.
pub const STATUS_OK: &str = "OK";

// ---------------------------------------------------------------------------
// Document ids
// ---------------------------------------------------------------------------

/// Document identifier assigned by the service.
///
/// The service emits these as bare JSON integers wider than 64 bits, so the
/// value is held as a `BigInt` and decoded from the literal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(BigInt);

impl DocId {
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    pub fn into_inner(self) -> BigInt {
        self.0
    }
}

impl From<BigInt> for DocId {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

impl From<u64> for DocId {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl FromStr for DocId {
    type Err = ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for DocId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let number =
            serde_json::Number::from_str(&self.0.to_string()).map_err(S::Error::custom)?;
        number.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(deserializer)?;
        let digits = number.to_string();
        digits
            .parse()
            .map(Self)
            .map_err(|_| de::Error::custom(format!("docid is not an integer: {digits}")))
    }
}

// ---------------------------------------------------------------------------
// /info/
// ---------------------------------------------------------------------------

/// Response from `GET /info/`: the service's current limits and defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoResponse {
    pub status_code: String,
    #[serde(rename = "status_msg")]
    pub status_message: String,
    #[serde(alias = "Results")]
    pub results: InfoResults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoResults {
    pub max_image_size: u64,
    pub default_language: String,
    pub max_video_size: u64,
    pub max_image_bytes: u64,
    pub default_model: String,
    pub max_video_bytes: u64,
    pub max_video_duration: u64,
    pub max_video_batch_size: u64,
    pub min_video_size: u64,
    pub min_image_size: u64,
    pub max_batch_size: u64,
    pub api_version: f64,
}

// ---------------------------------------------------------------------------
// /tag/
// ---------------------------------------------------------------------------

/// Request body for `POST /tag/`.
///
/// `local_ids`, when given, runs parallel to `urls` and is echoed back on each
/// result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    #[serde(rename = "url")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TagRequest {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn local_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.urls.is_empty() {
            return Err(ValidationError::MissingUrls);
        }
        Ok(())
    }
}

/// Envelope returned by `POST /tag/`, generic over the per-item tag payload.
///
/// Container keys also decode in their capitalised form (`Results`, `Meta`).
/// A body carrying both spellings of one key is rejected as a duplicate field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct TagResponse<T> {
    pub status_code: String,
    #[serde(rename = "status_msg")]
    pub status_message: String,
    #[serde(alias = "Meta")]
    pub meta: TagMeta,
    #[serde(alias = "Results")]
    pub results: Vec<TagResult<T>>,
}

impl<T> TagResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

pub type ImageTagResponse = TagResponse<ImageTag>;
pub type VideoTagResponse = TagResponse<VideoTag>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagMeta {
    #[serde(alias = "Tag")]
    pub tag: TagMetaInfo,
}

/// Which model and configuration produced the results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagMetaInfo {
    /// Kept as the literal JSON number; the service sends fractional epochs.
    pub timestamp: Option<serde_json::Number>,
    pub model: String,
    pub config: String,
}

/// One entry of `results`, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct TagResult<T> {
    pub docid: Option<DocId>,
    pub url: String,
    pub status_code: String,
    #[serde(rename = "status_msg")]
    pub status_message: String,
    pub local_id: String,
    #[serde(rename = "docid_str")]
    pub docid_string: String,
    #[serde(alias = "Result")]
    pub result: TagOutput<T>,
}

pub type ImageTagResult = TagResult<ImageTag>;
pub type VideoTagResult = TagResult<VideoTag>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct TagOutput<T> {
    #[serde(alias = "Tag")]
    pub tag: T,
}

/// Tags for a single image: three parallel lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageTag {
    pub classes: Vec<String>,
    #[serde(rename = "catids")]
    pub cat_ids: Vec<String>,
    pub probs: Vec<f32>,
}

/// Tags for a video: one inner list per segment for each field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoTag {
    pub classes: Vec<Vec<String>>,
    #[serde(rename = "catids", deserialize_with = "segmented_cat_ids")]
    pub cat_ids: Vec<Vec<String>>,
    pub probs: Vec<Vec<f32>>,
}

/// Some deployments send video `catids` as one flat list instead of one list
/// per segment. A flat list decodes as a single segment.
fn segmented_cat_ids<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Id(String),
        Segment(Vec<String>),
    }

    let entries = Vec::<Entry>::deserialize(deserializer)?;
    let mut flat = Vec::new();
    let mut segments = Vec::new();
    for entry in entries {
        match entry {
            Entry::Id(id) => flat.push(id),
            Entry::Segment(segment) => segments.push(segment),
        }
    }
    match (flat.is_empty(), segments.is_empty()) {
        (true, _) => Ok(segments),
        (false, true) => Ok(vec![flat]),
        (false, false) => Err(de::Error::custom("catids mixes ids and segments")),
    }
}

// ---------------------------------------------------------------------------
// /feedback/
// ---------------------------------------------------------------------------

/// Request body for `POST /feedback/`.
///
/// Targets are named either by `doc_ids` or by `urls`, never both. Every
/// list is omitted from the body when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    #[serde(rename = "docids", skip_serializing_if = "Vec::is_empty")]
    pub doc_ids: Vec<String>,
    #[serde(rename = "url", skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_tags: Vec<String>,
    #[serde(rename = "dissimilar_docids", skip_serializing_if = "Vec::is_empty")]
    pub dissimilar_doc_ids: Vec<String>,
    #[serde(rename = "similar_docids", skip_serializing_if = "Vec::is_empty")]
    pub similar_doc_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_click: Vec<String>,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl FeedbackForm {
    pub fn for_doc_ids<I, S>(doc_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            doc_ids: owned(doc_ids),
            ..Self::default()
        }
    }

    pub fn for_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: owned(urls),
            ..Self::default()
        }
    }

    pub fn add_tags<I: IntoIterator<Item = S>, S: Into<String>>(mut self, tags: I) -> Self {
        self.add_tags = owned(tags);
        self
    }

    pub fn remove_tags<I: IntoIterator<Item = S>, S: Into<String>>(mut self, tags: I) -> Self {
        self.remove_tags = owned(tags);
        self
    }

    pub fn similar_doc_ids<I: IntoIterator<Item = S>, S: Into<String>>(mut self, ids: I) -> Self {
        self.similar_doc_ids = owned(ids);
        self
    }

    pub fn dissimilar_doc_ids<I: IntoIterator<Item = S>, S: Into<String>>(mut self, ids: I) -> Self {
        self.dissimilar_doc_ids = owned(ids);
        self
    }

    pub fn search_click<I: IntoIterator<Item = S>, S: Into<String>>(mut self, terms: I) -> Self {
        self.search_click = owned(terms);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.doc_ids.is_empty(), self.urls.is_empty()) {
            (true, true) => Err(ValidationError::MissingTarget),
            (false, false) => Err(ValidationError::ConflictingTargets),
            _ => Ok(()),
        }
    }
}

/// Response from `POST /feedback/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackResponse {
    pub status_code: String,
    #[serde(rename = "status_msg")]
    pub status_message: String,
}

// ---------------------------------------------------------------------------
// /token/
// ---------------------------------------------------------------------------

/// Response from `POST /token/` (client-credentials grant).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub scope: String,
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docid_keeps_digits_beyond_u64() {
        let body = r#"{"results":[{"docid":123456789012345678901234567890,"url":"u"}]}"#;
        let resp: ImageTagResponse = serde_json::from_str(body).unwrap();
        let docid = resp.results[0].docid.as_ref().unwrap();
        assert_eq!(docid.to_string(), "123456789012345678901234567890");
        assert_eq!(
            docid.as_bigint(),
            &"123456789012345678901234567890".parse::<BigInt>().unwrap()
        );
    }

    #[test]
    fn docid_serializes_as_bare_number() {
        let id: DocId = "98765432109876543210987".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "98765432109876543210987");
    }

    #[test]
    fn docid_rejects_fraction() {
        let result: Result<DocId, _> = serde_json::from_str("1.5");
        assert!(result.is_err());
    }

    #[test]
    fn null_docid_is_none() {
        let result: ImageTagResult = serde_json::from_str(r#"{"docid":null}"#).unwrap();
        assert!(result.docid.is_none());
    }

    #[test]
    fn video_tag_keeps_segment_nesting() {
        let body = r#"{
            "status_code": "OK",
            "results": [{
                "url": "v.mp4",
                "result": {"tag": {
                    "classes": [["cat","dog"],["cat"]],
                    "catids": [["1","2"],["1"]],
                    "probs": [[0.9,0.5],[0.8]]
                }}
            }]
        }"#;
        let resp: VideoTagResponse = serde_json::from_str(body).unwrap();
        let tag = &resp.results[0].result.tag;
        assert_eq!(tag.classes.len(), 2);
        assert_eq!(tag.classes[0], vec!["cat", "dog"]);
        assert_eq!(tag.classes[1], vec!["cat"]);
        assert_eq!(tag.cat_ids[1], vec!["1"]);
        assert_eq!(tag.probs[0].len(), 2);
    }

    #[test]
    fn video_catids_accept_flat_list() {
        let body = r#"{"classes":[["cat","dog"],["cat"]],"catids":["1","2"],"probs":[[0.9,0.5],[0.8]]}"#;
        let tag: VideoTag = serde_json::from_str(body).unwrap();
        assert_eq!(tag.cat_ids, vec![vec!["1", "2"]]);
        assert_eq!(tag.classes.len(), 2);

        let empty: VideoTag = serde_json::from_str(r#"{"catids":[]}"#).unwrap();
        assert!(empty.cat_ids.is_empty());

        let mixed: Result<VideoTag, _> = serde_json::from_str(r#"{"catids":["1",["2"]]}"#);
        assert!(mixed.is_err());
    }

    #[test]
    fn both_key_spellings_are_a_duplicate_field() {
        let result: Result<ImageTagResponse, _> =
            serde_json::from_str(r#"{"results":[],"Results":[]}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate field"), "{err}");
    }

    #[test]
    fn capitalised_container_keys_are_accepted() {
        let body = r#"{
            "status_code": "OK",
            "Meta": {"Tag": {"model": "general-v1.3", "config": "0b2b7436987dd912e077ff576731f8b7", "timestamp": 1451945197.398036}},
            "Results": [{"url": "a", "Result": {"Tag": {"classes": ["x"], "catids": ["7"], "probs": [0.5]}}}]
        }"#;
        let resp: ImageTagResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.meta.tag.model, "general-v1.3");
        assert_eq!(resp.meta.tag.timestamp.as_ref().unwrap().to_string(), "1451945197.398036");
        assert_eq!(resp.results[0].result.tag.classes, vec!["x"]);
    }

    #[test]
    fn info_missing_fields_default() {
        let resp: InfoResponse =
            serde_json::from_str(r#"{"status_code":"OK","results":{"max_image_size":1024}}"#).unwrap();
        assert_eq!(resp.results.max_image_size, 1024);
        assert_eq!(resp.results.max_batch_size, 0);
        assert!(resp.status_message.is_empty());
    }

    #[test]
    fn info_wrong_type_is_error() {
        let result: Result<InfoResponse, _> =
            serde_json::from_str(r#"{"results":{"max_image_size":"big"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn tag_request_omits_absent_optionals() {
        let json = serde_json::to_value(TagRequest::new(["a"])).unwrap();
        assert_eq!(json, serde_json::json!({"url": ["a"]}));
    }

    #[test]
    fn tag_request_rejects_empty_urls() {
        assert_eq!(
            TagRequest::default().validate(),
            Err(ValidationError::MissingUrls)
        );
        assert!(TagRequest::new(["a"]).validate().is_ok());
    }

    #[test]
    fn feedback_form_validation() {
        assert_eq!(
            FeedbackForm::default().validate(),
            Err(ValidationError::MissingTarget)
        );
        let mut both = FeedbackForm::for_doc_ids(["1"]);
        both.urls.push("http://x".into());
        assert_eq!(both.validate(), Err(ValidationError::ConflictingTargets));
        assert!(FeedbackForm::for_urls(["http://x"]).validate().is_ok());
    }

    #[test]
    fn feedback_form_serializes_only_present_lists() {
        let form = FeedbackForm::for_doc_ids(["15512461224882630000"])
            .add_tags(["cat", "animal"])
            .similar_doc_ids(["1"]);
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "docids": ["15512461224882630000"],
                "add_tags": ["cat", "animal"],
                "similar_docids": ["1"]
            })
        );
    }
}
