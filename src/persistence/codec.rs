//! Pose text codec
//!
//! Each pose field is rendered as a bracketed, comma-separated list of f32
//! values using the shortest decimal that parses back to the same bits:
//! - translation / scale: `[x,y,z]`
//! - rotation: `[w,x,y,z]` (scalar first)
//!
//! Decoding accepts the same layout with or without brackets and ignores
//! surrounding whitespace. Anything else is `CodecError::Malformed`.

use std::fmt::Write as _;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// Longest input excerpt kept in an error message
const ERROR_EXCERPT_LEN: usize = 48;

/// Unparseable pose text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("malformed pose text {text:?}: {reason}")]
    Malformed { text: String, reason: String },
}

impl CodecError {
    fn malformed(text: &str, reason: impl Into<String>) -> Self {
        let text = match text.char_indices().nth(ERROR_EXCERPT_LEN) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        };
        CodecError::Malformed {
            text,
            reason: reason.into(),
        }
    }
}

/// Rendered pose, stored as a three-element JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPose(pub String, pub String, pub String);

impl EncodedPose {
    pub fn translation(&self) -> &str {
        &self.0
    }

    pub fn rotation(&self) -> &str {
        &self.1
    }

    pub fn scale(&self) -> &str {
        &self.2
    }
}

fn render(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 12 + 2);
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // f32 Display is the shortest round-trip representation
        let _ = write!(out, "{v}");
    }
    out.push(']');
    out
}

/// Parse exactly `N` comma-separated floats
fn parse_components<const N: usize>(text: &str) -> Result<[f32; N], CodecError> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix('[') {
        body = rest
            .strip_suffix(']')
            .ok_or_else(|| CodecError::malformed(text, "unterminated '['"))?;
    }

    let mut out = [0.0f32; N];
    let mut count = 0;
    for token in body.split(',') {
        if count == N {
            return Err(CodecError::malformed(
                text,
                format!("expected {N} components, found more"),
            ));
        }
        let token = token.trim();
        out[count] = token
            .parse::<f32>()
            .map_err(|_| CodecError::malformed(text, format!("invalid number {token:?}")))?;
        count += 1;
    }

    if count < N {
        return Err(CodecError::malformed(
            text,
            format!("expected {N} components, found {count}"),
        ));
    }
    Ok(out)
}

pub fn encode_vector3(v: Vec3) -> String {
    render(&v.to_array())
}

/// Scalar first: `[w,x,y,z]`
pub fn encode_quaternion(q: Quat) -> String {
    render(&[q.w, q.x, q.y, q.z])
}

/// Render all three pose fields
pub fn encode(pose: &Pose) -> EncodedPose {
    EncodedPose(
        encode_vector3(pose.translation),
        encode_quaternion(pose.rotation),
        encode_vector3(pose.scale),
    )
}

pub fn decode_vector3(text: &str) -> Result<Vec3, CodecError> {
    parse_components::<3>(text).map(Vec3::from_array)
}

/// Parse `[w,x,y,z]`. The result is not normalized.
pub fn decode_quaternion(text: &str) -> Result<Quat, CodecError> {
    let [w, x, y, z] = parse_components::<4>(text)?;
    Ok(Quat::from_xyzw(x, y, z, w))
}

pub fn decode(encoded: &EncodedPose) -> Result<Pose, CodecError> {
    Ok(Pose {
        translation: decode_vector3(encoded.translation())?,
        rotation: decode_quaternion(encoded.rotation())?,
        scale: decode_vector3(encoded.scale())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn finite() -> prop::num::f32::Any {
        prop::num::f32::NORMAL | prop::num::f32::SUBNORMAL | prop::num::f32::ZERO
    }

    prop_compose! {
        fn arb_pose()(
            t in prop::array::uniform3(finite()),
            r in prop::array::uniform4(finite()),
            s in prop::array::uniform3(finite()),
        ) -> Pose {
            Pose::new(Vec3::from_array(t), Quat::from_array(r), Vec3::from_array(s))
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip_is_exact(pose in arb_pose()) {
            let decoded = decode(&encode(&pose)).unwrap();
            prop_assert_eq!(decoded.translation.to_array(), pose.translation.to_array());
            prop_assert_eq!(decoded.rotation.to_array(), pose.rotation.to_array());
            prop_assert_eq!(decoded.scale.to_array(), pose.scale.to_array());
        }

        #[test]
        fn prop_garbage_never_panics(text in "\\PC*") {
            let _ = decode_vector3(&text);
            let _ = decode_quaternion(&text);
        }

        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let text = String::from_utf8_lossy(&bytes);
            let _ = decode_vector3(&text);
            let _ = decode_quaternion(&text);
        }
    }

    #[test]
    fn test_encode_layout() {
        let pose = Pose::new(
            Vec3::new(1.0, -0.5, 0.25),
            Quat::from_xyzw(0.0, 0.7071068, 0.0, 0.7071068),
            Vec3::ONE,
        );
        let encoded = encode(&pose);
        assert_eq!(encoded.translation(), "[1,-0.5,0.25]");
        assert_eq!(encoded.rotation(), "[0.7071068,0,0.7071068,0]");
        assert_eq!(encoded.scale(), "[1,1,1]");
    }

    #[test]
    fn test_quaternion_scalar_first() {
        let q = decode_quaternion("[0.5, 0.1, 0.2, 0.3]").unwrap();
        assert_eq!(q.w, 0.5);
        assert_eq!(q.x, 0.1);
        assert_eq!(q.y, 0.2);
        assert_eq!(q.z, 0.3);
    }

    #[test]
    fn test_decode_lenient_whitespace_and_brackets() {
        assert_eq!(
            decode_vector3("  [ 1.5 , 2 , -3e2 ] ").unwrap(),
            Vec3::new(1.5, 2.0, -300.0)
        );
        assert_eq!(decode_vector3("1,2,3").unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_decode_rejects_wrong_arity() {
        assert!(decode_vector3("[1,2]").is_err());
        assert!(decode_vector3("[1,2,3,4]").is_err());
        assert!(decode_quaternion("[1,0,0]").is_err());
        assert!(decode_vector3("[]").is_err());
        assert!(decode_vector3("").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_vector3("[1,two,3]").is_err());
        assert!(decode_vector3("[1,2,3").is_err());
        assert!(decode_vector3("[1,,3]").is_err());
        // Legacy debug-print form is not a supported layout
        assert!(decode_vector3("SIMD3<Float>(1.0, 2.0, 3.0)").is_err());
    }

    #[test]
    fn test_non_finite_round_trip() {
        let v = Vec3::new(f32::INFINITY, f32::NEG_INFINITY, 0.0);
        assert_eq!(decode_vector3(&encode_vector3(v)).unwrap(), v);
        assert!(decode_vector3(&encode_vector3(Vec3::NAN)).unwrap().is_nan());
    }

    #[test]
    fn test_error_excerpt_truncated() {
        let long = "x".repeat(500);
        match decode_vector3(&long) {
            Err(CodecError::Malformed { text, .. }) => assert!(text.len() < 60),
            Ok(_) => panic!("garbage decoded"),
        }
    }
}
