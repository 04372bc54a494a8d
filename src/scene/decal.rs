/// Stable decal identity; also the key of the render cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DecalId(pub u64);

impl std::fmt::Display for DecalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decal-{}", self.0)
    }
}

/// Lifecycle of a decal record. Deletion removes the record, so there is no
/// terminal variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecalPhase {
    #[default]
    Uploaded,
    Placed,
    Edited,
    Repositioned,
}

/// Provisional placement for a decal nobody has clicked onto the body yet.
pub const UNPLACED_POSITION: [f32; 3] = [0.0, 0.0, 0.0];
pub const UNPLACED_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Decal record. Position, rotation (XYZ Euler, radians) and normal are in
/// world space.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decal {
    pub id: DecalId,
    pub image_url: String,
    pub file_name: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub opacity: f32,
    pub normal: [f32; 3],
    #[serde(default)]
    pub phase: DecalPhase,
}

impl Decal {
    pub fn uploaded(id: DecalId, image_url: &str, file_name: &str, opacity: f32) -> Self {
        Self {
            id,
            image_url: image_url.to_string(),
            file_name: file_name.to_string(),
            position: UNPLACED_POSITION,
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
            opacity,
            normal: UNPLACED_NORMAL,
            phase: DecalPhase::Uploaded,
        }
    }

    /// Spin about the decal's own forward axis, set from the editor.
    pub fn spin(&self) -> f32 {
        self.rotation[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decal_serializes_with_camel_case_keys() {
        let decal = Decal::uploaded(DecalId(3), "sha256:ab", "flag.png", 0.8);
        let json = serde_json::to_value(&decal).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["imageUrl"], "sha256:ab");
        assert_eq!(json["fileName"], "flag.png");
        assert_eq!(json["phase"], "uploaded");
    }

    #[test]
    fn missing_phase_defaults_to_uploaded() {
        let json = r#"{"id":1,"imageUrl":"sha256:ab","fileName":"a.png","position":[0,0,0],
            "rotation":[0,0,0],"scale":[1,1,1],"opacity":1.0,"normal":[0,0,1]}"#;
        let decal: Decal = serde_json::from_str(json).unwrap();
        assert_eq!(decal.phase, DecalPhase::Uploaded);
        assert_eq!(decal.id.to_string(), "decal-1");
    }
}
