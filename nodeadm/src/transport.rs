//! Transport decoding of raw configuration bytes.
//!
//! User data and config files may arrive base64-encoded, gzip-compressed,
//! wrapped in a MIME multipart envelope, or any layering of those. The
//! decoder peels each layer and yields the plain documents inside.

use std::borrow::Cow;
use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::MultiGzDecoder;
use log::debug;
use mailparse::ParsedMail;

use crate::codec::Scheme;
use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Peels transport layers off raw configuration bytes.
#[derive(Debug, Clone)]
pub struct TransportDecoder {
    media_type: String,
}

impl Default for TransportDecoder {
    fn default() -> Self {
        Self::new(Scheme::node_config().media_type())
    }
}

impl TransportDecoder {
    /// Creates a decoder that keeps MIME parts of the given media type.
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into().to_ascii_lowercase(),
        }
    }

    /// Decodes raw bytes into zero or more plain documents.
    ///
    /// Base64 is tried first and silently skipped when the input is not
    /// valid base64. Gzip is detected by its magic number. A MIME multipart
    /// envelope yields one entry per matching part; other parts are
    /// ignored. An empty result means the envelope held no configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gzip`] if gzip-marked data is corrupt, and
    /// [`Error::Part`] or [`Error::Mime`] for failures inside a MIME part.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeadm::transport::TransportDecoder;
    ///
    /// let decoder = TransportDecoder::default();
    /// let docs = decoder.decode(b"a2luZDogTm9kZUNvbmZpZwo=").unwrap();
    /// assert_eq!(docs, vec![b"kind: NodeConfig\n".to_vec()]);
    /// ```
    pub fn decode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>> {
        let data = decode_if_base64(data);
        let data = decompress_if_gzip(&data)?;
        match parse_multipart(&data) {
            Some(mail) => self.extract_parts(&mail),
            None => Ok(vec![data.into_owned()]),
        }
    }

    fn extract_parts(&self, mail: &ParsedMail<'_>) -> Result<Vec<Vec<u8>>> {
        let mut documents = Vec::new();
        for (index, part) in mail.subparts.iter().enumerate() {
            if part.ctype.mimetype != self.media_type {
                debug!("skipping MIME part {index} of type {}", part.ctype.mimetype);
                continue;
            }
            let body = part.get_body_raw().map_err(|e| Error::Mime {
                part: index,
                message: e.to_string(),
            })?;
            let inner = self.decode(&body).map_err(|e| Error::Part {
                index,
                source: Box::new(e),
            })?;
            documents.extend(inner);
        }
        debug!(
            "found {} node configuration part(s) in MIME envelope",
            documents.len()
        );
        Ok(documents)
    }
}

/// Returns the base64-decoded bytes, or the input unchanged if it is not
/// valid base64. Line breaks are ignored.
#[must_use]
pub fn decode_if_base64(data: &[u8]) -> Cow<'_, [u8]> {
    let compact: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| *b != b'\n' && *b != b'\r')
        .collect();
    if compact.is_empty() {
        return Cow::Borrowed(data);
    }
    match STANDARD.decode(&compact) {
        Ok(decoded) => {
            debug!("decoded {} bytes of base64", compact.len());
            Cow::Owned(decoded)
        }
        Err(_) => Cow::Borrowed(data),
    }
}

/// Decompresses gzip data, or returns the input unchanged if it does not
/// start with the gzip magic number.
///
/// # Errors
///
/// Returns [`Error::Gzip`] if the data is marked as gzip but corrupt.
pub fn decompress_if_gzip(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(data));
    }
    let mut out = Vec::new();
    MultiGzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(Error::Gzip)?;
    debug!("decompressed {} gzip bytes into {}", data.len(), out.len());
    Ok(Cow::Owned(out))
}

fn parse_multipart(data: &[u8]) -> Option<ParsedMail<'_>> {
    let mail = mailparse::parse_mail(data).ok()?;
    let is_multipart = mail.ctype.mimetype.starts_with("multipart/")
        && mail.ctype.params.contains_key("boundary");
    is_multipart.then_some(mail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const DOC: &str = "apiVersion: node.eks.aws/v1alpha1\nkind: NodeConfig\nspec:\n  cluster:\n    name: test\n";

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn multipart(parts: &[(&str, &str)]) -> String {
        let mut out = String::from(
            "MIME-Version: 1.0\nContent-Type: multipart/mixed; boundary=\"BOUNDARY\"\n\n",
        );
        for (content_type, body) in parts {
            out.push_str(&format!("--BOUNDARY\nContent-Type: {content_type}\n\n{body}\n"));
        }
        out.push_str("--BOUNDARY--\n");
        out
    }

    #[test]
    fn test_plain_document_passes_through() {
        let docs = TransportDecoder::default().decode(DOC.as_bytes()).unwrap();
        assert_eq!(docs, vec![DOC.as_bytes().to_vec()]);
    }

    #[test]
    fn test_gzip() {
        let docs = TransportDecoder::default().decode(&gzip(DOC.as_bytes())).unwrap();
        assert_eq!(docs, vec![DOC.as_bytes().to_vec()]);
    }

    #[test]
    fn test_base64_with_line_breaks() {
        let encoded = STANDARD.encode(DOC);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(20)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\r\n");
        let docs = TransportDecoder::default().decode(wrapped.as_bytes()).unwrap();
        assert_eq!(docs, vec![DOC.as_bytes().to_vec()]);
    }

    #[test]
    fn test_base64_of_gzip() {
        let encoded = STANDARD.encode(gzip(DOC.as_bytes()));
        let docs = TransportDecoder::default().decode(encoded.as_bytes()).unwrap();
        assert_eq!(docs, vec![DOC.as_bytes().to_vec()]);
    }

    #[test]
    fn test_corrupt_gzip_is_fatal() {
        let mut data = GZIP_MAGIC.to_vec();
        data.extend_from_slice(b"definitely not deflate");
        let err = TransportDecoder::default().decode(&data).unwrap_err();
        assert!(matches!(err, Error::Gzip(_)));
    }

    #[test]
    fn test_multipart_keeps_only_node_config_parts() {
        let data = multipart(&[
            ("text/x-shellscript; charset=\"us-ascii\"", "#!/bin/bash\necho hi"),
            ("application/node.eks.aws", DOC.trim_end()),
        ]);
        let docs = TransportDecoder::default().decode(data.as_bytes()).unwrap();
        assert_eq!(docs.len(), 1);
        let text = String::from_utf8(docs[0].clone()).unwrap();
        assert!(text.contains("kind: NodeConfig"));
        assert!(!text.contains("echo hi"));
    }

    #[test]
    fn test_multipart_multiple_parts_in_order() {
        let first = "kind: NodeConfig\nspec: {cluster: {name: first}}";
        let second = "kind: NodeConfig\nspec: {cluster: {name: second}}";
        let data = multipart(&[
            ("application/node.eks.aws", first),
            ("application/node.eks.aws", second),
        ]);
        let docs = TransportDecoder::default().decode(data.as_bytes()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(String::from_utf8_lossy(&docs[0]).contains("first"));
        assert!(String::from_utf8_lossy(&docs[1]).contains("second"));
    }

    #[test]
    fn test_multipart_without_matching_parts_is_empty() {
        let data = multipart(&[("text/x-shellscript", "#!/bin/bash\necho hi")]);
        let docs = TransportDecoder::default().decode(data.as_bytes()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_multipart_part_may_be_base64_gzip() {
        let part = STANDARD.encode(gzip(DOC.as_bytes()));
        let data = multipart(&[("application/node.eks.aws", &part)]);
        let docs = TransportDecoder::default().decode(data.as_bytes()).unwrap();
        assert_eq!(docs, vec![DOC.as_bytes().to_vec()]);
    }

    #[test]
    fn test_whole_envelope_gzipped() {
        let data = multipart(&[("application/node.eks.aws", DOC.trim_end())]);
        let docs = TransportDecoder::default()
            .decode(&gzip(data.as_bytes()))
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_non_multipart_mail_headers_fall_back() {
        let data = "Content-Type: text/plain\n\nhello\n";
        let docs = TransportDecoder::default().decode(data.as_bytes()).unwrap();
        assert_eq!(docs, vec![data.as_bytes().to_vec()]);
    }

    #[test]
    fn test_empty_input() {
        let docs = TransportDecoder::default().decode(b"").unwrap();
        assert_eq!(docs, vec![Vec::<u8>::new()]);
    }
}
