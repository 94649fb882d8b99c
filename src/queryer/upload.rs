use crate::error::Result;
use bytes::{BufMut, Bytes, BytesMut};
use indexmap::IndexMap;
use rand::RngCore;
use serde::{Serialize, Serializer};

/// A file that's sent alongside a query as part of a multipart request.
///
/// Uploads are placed in a query's variables and serialize to `null`. Before a request is sent
/// they're replaced with `null` and the file contents are sent as separate parts, following the
/// GraphQL multipart request format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file: Bytes,
    pub file_name: String,
}

impl Upload {
    pub fn new<B: Into<Bytes>, S: Into<String>>(file: B, file_name: S) -> Self {
        Upload {
            file: file.into(),
            file_name: file_name.into(),
        }
    }
}

impl Serialize for Upload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_none()
    }
}

/// The value of a query variable, which may contain [Upload]s at any depth.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Upload(Upload),
    List(Vec<VariableValue>),
    Object(IndexMap<String, VariableValue>),
    Json(serde_json::Value),
}

impl VariableValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, VariableValue::Json(serde_json::Value::Null))
    }
}

impl Default for VariableValue {
    fn default() -> Self {
        VariableValue::Json(serde_json::Value::Null)
    }
}

impl From<Upload> for VariableValue {
    fn from(upload: Upload) -> Self {
        VariableValue::Upload(upload)
    }
}

impl From<serde_json::Value> for VariableValue {
    fn from(value: serde_json::Value) -> Self {
        VariableValue::Json(value)
    }
}

impl From<Vec<VariableValue>> for VariableValue {
    fn from(list: Vec<VariableValue>) -> Self {
        VariableValue::List(list)
    }
}

impl From<IndexMap<String, VariableValue>> for VariableValue {
    fn from(object: IndexMap<String, VariableValue>) -> Self {
        VariableValue::Object(object)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Json(value.into())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Json(value.into())
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Json(value.into())
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Json(value.into())
    }
}

/// The uploads of a request in the order they were found, each with the variable paths that
/// refer to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadMap {
    uploads: Vec<(Upload, Vec<String>)>,
}

impl UploadMap {
    /// Records an upload found at a path relative to the request's variables, e.g. `file` or
    /// `input.files.0`.
    pub fn add(&mut self, upload: Upload, variable_path: &str) {
        self.uploads
            .push((upload, vec![format!("variables.{}", variable_path)]));
    }

    /// Returns the `map` part of a multipart request, mapping each upload's index to its paths.
    pub fn upload_map(&self) -> IndexMap<String, Vec<String>> {
        self.uploads
            .iter()
            .enumerate()
            .map(|(index, (_, paths))| (index.to_string(), paths.clone()))
            .collect()
    }

    pub fn uploads(&self) -> impl Iterator<Item = &Upload> {
        self.uploads.iter().map(|(upload, _)| upload)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }
}

/// Moves every [Upload] out of a set of variables, leaving `null` in its place.
pub fn extract_files(variables: &mut IndexMap<String, VariableValue>) -> UploadMap {
    let mut upload_map = UploadMap::default();
    for (name, value) in variables.iter_mut() {
        extract(&mut upload_map, value, name.clone());
    }
    upload_map
}

fn extract(upload_map: &mut UploadMap, value: &mut VariableValue, path: String) {
    match value {
        VariableValue::Upload(_) => {
            if let VariableValue::Upload(upload) = std::mem::take(value) {
                upload_map.add(upload, &path);
            }
        }
        VariableValue::Object(object) => {
            for (key, value) in object.iter_mut() {
                extract(upload_map, value, format!("{}.{}", path, key));
            }
        }
        VariableValue::List(list) => {
            for (index, value) in list.iter_mut().enumerate() {
                extract(upload_map, value, format!("{}.{}", path, index));
            }
        }
        VariableValue::Json(_) => {}
    }
}

fn escape_quotes(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_part_header(body: &mut BytesMut, boundary: &str, disposition: &str, first: bool) {
    if !first {
        body.put_slice(b"\r\n");
    }
    body.put_slice(b"--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"\r\nContent-Disposition: form-data; ");
    body.put_slice(disposition.as_bytes());
    body.put_slice(b"\r\n");
}

/// Encodes a JSON payload and its uploads as a `multipart/form-data` body.
///
/// The body contains an `operations` part holding the payload, a `map` part as returned by
/// [`UploadMap::upload_map`], and one part per upload named by its index. Returns the body and
/// its content type, which carries the random boundary.
pub fn prepare_multipart(payload: &[u8], upload_map: &UploadMap) -> Result<(Bytes, String)> {
    let boundary = format!("{:016x}", rand::thread_rng().next_u64());
    let map = serde_json::to_vec(&upload_map.upload_map())?;

    let file_size: usize = upload_map.uploads().map(|upload| upload.file.len()).sum();
    let mut body = BytesMut::with_capacity(payload.len() + map.len() + file_size + 512);

    write_part_header(&mut body, &boundary, "name=\"operations\"", true);
    body.put_slice(b"\r\n");
    body.put_slice(payload);

    write_part_header(&mut body, &boundary, "name=\"map\"", false);
    body.put_slice(b"\r\n");
    body.put_slice(&map);

    for (index, upload) in upload_map.uploads().enumerate() {
        let disposition = format!(
            "name=\"{}\"; filename=\"{}\"",
            index,
            escape_quotes(&upload.file_name)
        );
        write_part_header(&mut body, &boundary, &disposition, false);
        body.put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.put_slice(&upload.file);
    }

    body.put_slice(b"\r\n--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"--\r\n");

    let content_type = format!("multipart/form-data; boundary={}", boundary);
    Ok((body.freeze(), content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upload(name: &str) -> VariableValue {
        Upload::new(format!("contents of {}", name).into_bytes(), name).into()
    }

    #[test]
    fn uploads_serialize_to_null() {
        let value: VariableValue = upload("a.txt");
        assert_eq!(serde_json::to_value(&value).unwrap(), json!(null));
    }

    #[test]
    fn extracts_top_level_upload() {
        let mut variables = IndexMap::new();
        variables.insert("file".to_string(), upload("a.txt"));
        variables.insert("name".to_string(), "hello".into());

        let upload_map = extract_files(&mut variables);
        assert_eq!(upload_map.len(), 1);
        assert_eq!(
            serde_json::to_value(upload_map.upload_map()).unwrap(),
            json!({ "0": ["variables.file"] })
        );
        assert!(variables["file"].is_null());
        assert_eq!(variables["name"], VariableValue::from("hello"));
    }

    #[test]
    fn extracts_nested_uploads() {
        let mut input = IndexMap::new();
        input.insert("avatar".to_string(), upload("avatar.png"));
        input.insert(
            "attachments".to_string(),
            VariableValue::List(vec![
                upload("first.pdf"),
                VariableValue::default(),
                upload("third.pdf"),
            ]),
        );

        let mut variables = IndexMap::new();
        variables.insert("input".to_string(), VariableValue::Object(input));

        let upload_map = extract_files(&mut variables);
        assert_eq!(
            serde_json::to_value(upload_map.upload_map()).unwrap(),
            json!({
                "0": ["variables.input.avatar"],
                "1": ["variables.input.attachments.0"],
                "2": ["variables.input.attachments.2"]
            })
        );
        let names = upload_map
            .uploads()
            .map(|upload| upload.file_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["avatar.png", "first.pdf", "third.pdf"]);

        assert_eq!(
            serde_json::to_value(&variables).unwrap(),
            json!({ "input": { "avatar": null, "attachments": [null, null, null] } })
        );
    }

    #[test]
    fn no_uploads() {
        let mut variables = IndexMap::new();
        variables.insert("id".to_string(), VariableValue::from(1i64));
        assert!(extract_files(&mut variables).is_empty());
    }

    #[test]
    fn multipart_body() {
        let mut variables = IndexMap::new();
        variables.insert("file".to_string(), upload("my \"file\".txt"));
        let upload_map = extract_files(&mut variables);

        let payload = br#"{"query":"mutation($file: Upload!) { upload(file: $file) }","variables":{"file":null}}"#;
        let (body, content_type) = prepare_multipart(payload, &upload_map).unwrap();

        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        assert_eq!(boundary.len(), 16);

        let body = String::from_utf8(body.to_vec()).unwrap();
        let expected = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"operations\"\r\n\r\n\
             {payload}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"map\"\r\n\r\n\
             {{\"0\":[\"variables.file\"]}}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"0\"; filename=\"my \\\"file\\\".txt\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             contents of my \"file\".txt\r\n\
             --{b}--\r\n",
            b = boundary,
            payload = std::str::from_utf8(payload).unwrap(),
        );
        assert_eq!(body, expected);
    }
}
