//! Newline-delimited framing for the status stream.

use tokio_util::codec::LinesCodec;

/// Maximum accepted line length in bytes (excluding the delimiter).
///
/// Status lines are well under 100 bytes; anything larger is a peer bug.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Returns the codec used on both ends of a status connection.
pub fn line_codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_LINE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    #[test]
    fn test_split_and_joined_frames() {
        let mut codec = line_codec();
        let mut buf = BytesMut::from("Notification: Lecture has 1/10 st");

        // Partial line yields nothing yet
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"udents registered.\nNotification: Lecture has 2/10 students registered.\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("Notification: Lecture has 1/10 students registered.")
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("Notification: Lecture has 2/10 students registered.")
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = line_codec();
        let mut buf = BytesMut::new();
        codec.encode("hello", &mut buf).unwrap();
        assert_eq!(&buf[..], b"hello\n");
    }

    #[test]
    fn test_oversized_line_rejected() {
        let mut codec = line_codec();
        let mut buf = BytesMut::from(vec![b'x'; MAX_LINE_LENGTH + 10].as_slice());
        assert!(codec.decode(&mut buf).is_err());
    }
}
