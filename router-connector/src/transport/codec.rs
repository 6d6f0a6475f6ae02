use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::properties::HandshakeProperties;

/// Maximum accepted frame, an open frame is a few hundred bytes at most.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024;

/// First frame each side sends on a new connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Open {
    #[serde(rename = "container-id")]
    pub container_id: String,
    #[serde(default)]
    pub properties: HandshakeProperties,
}

impl Open {
    pub fn new(container_id: impl Into<String>, properties: HandshakeProperties) -> Self {
        Self {
            container_id: container_id.into(),
            properties,
        }
    }
}

/// Length prefixed json frames.
#[derive(Debug)]
pub struct OpenCodec {
    inner: LengthDelimitedCodec,
}

impl Default for OpenCodec {
    fn default() -> Self {
        let inner = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_LENGTH)
            .new_codec();
        Self { inner }
    }
}

impl Encoder<Open> for OpenCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: Open, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(&item)?;
        self.inner.encode(Bytes::from(body), dst)?;
        Ok(())
    }
}

impl Decoder for OpenCodec {
    type Item = Open;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            None => Ok(None),
            Some(frame) => Ok(Some(serde_json::from_slice(&frame)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use serde_json::json;
    use tokio_util::codec::{Decoder, Encoder};

    use crate::properties::{FAILOVER_SERVER_LIST, HandshakeProperties};
    use crate::transport::codec::{Open, OpenCodec};

    #[test]
    fn test_partial_frame() {
        let properties: HandshakeProperties = [
            (FAILOVER_SERVER_LIST.to_string(), json!([{"network-host": "localhost", "port": "1"}])),
        ].into_iter().collect();
        let open = Open::new("QDR.B", properties);
        let mut codec = OpenCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(open.clone(), &mut buf).unwrap();

        let mut partial = buf.split_to(buf.len() - 3);
        assert!(codec.decode(&mut partial).unwrap().is_none());
        partial.unsplit(buf);
        assert_eq!(codec.decode(&mut partial).unwrap(), Some(open));
    }

    #[test]
    fn test_reject_garbage() {
        let mut codec = OpenCodec::default();
        let mut buf = BytesMut::new();
        codec.inner.encode(bytes::Bytes::from_static(b"not json"), &mut buf).unwrap();
        assert!(codec.decode(&mut buf).is_err());
    }
}
