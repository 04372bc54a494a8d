//! Decal placement engine: click-to-surface placement, editor changes and the
//! disposable render cache built from the decal records.

pub mod projector;
pub mod textures;

pub use projector::{project, DecalGeometry, ProjectOptions};
pub use textures::{content_key, Texture, TextureCache};

use crate::render::{raycast_mesh, CameraController, DecalMesh, SceneGraph, Viewport};
use crate::scene::{Decal, DecalId, DecalPhase, SceneStore};
use crate::validation::OPACITY_RANGE;
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum DecalError {
    #[error("failed to decode image '{file_name}': {source}")]
    TextureDecode {
        file_name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("unknown decal {0}")]
    UnknownDecal(DecalId),
    #[error("invalid decal edit: {0}")]
    InvalidEdit(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalSettings {
    /// World-space edge length of a decal at scale 1.
    pub base_size: f32,
    /// Projection depth relative to the larger visible edge.
    pub depth_factor: f32,
    pub default_opacity: f32,
    pub reject_backfaces: bool,
}

impl Default for DecalSettings {
    fn default() -> Self {
        Self {
            base_size: 0.5,
            depth_factor: 2.0,
            default_opacity: 1.0,
            reject_backfaces: true,
        }
    }
}

impl DecalSettings {
    /// Projection box for a decal; deeper than it is wide so curved panels
    /// are fully penetrated.
    pub fn projection_size(&self, scale: [f32; 3]) -> Vec3 {
        let width = scale[0] * self.base_size;
        let height = scale[1] * self.base_size;
        Vec3::new(width, height, width.max(height) * self.depth_factor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecalImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Editor slider changes; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecalEdit {
    pub scale: Option<[f32; 3]>,
    pub opacity: Option<f32>,
    /// Spin about the decal's forward axis, radians.
    pub rotation_z: Option<f32>,
    pub image: Option<DecalImage>,
}

impl DecalEdit {
    fn validate(&self) -> Result<(), DecalError> {
        if let Some(scale) = self.scale {
            if !scale.iter().all(|s| s.is_finite() && *s > 0.0) {
                return Err(DecalError::InvalidEdit(format!(
                    "scale must be positive and finite (got {:?})",
                    scale
                )));
            }
        }
        if let Some(opacity) = self.opacity {
            OPACITY_RANGE
                .check(f64::from(opacity))
                .map_err(DecalError::InvalidEdit)?;
        }
        if let Some(spin) = self.rotation_z {
            if !spin.is_finite() {
                return Err(DecalError::InvalidEdit(
                    "rotation_z must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn changes_geometry(&self) -> bool {
        self.scale.is_some() || self.rotation_z.is_some()
    }
}

/// Which decal the next body click acts on. Placement takes precedence over
/// selection because there is only one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// The next successful click places this decal, then switches to editing it.
    AwaitingPlacement(DecalId),
    /// Clicks reposition this decal; the selection survives each click.
    Editing(DecalId),
}

impl InteractionState {
    pub fn target(&self) -> Option<DecalId> {
        match self {
            InteractionState::Idle => None,
            InteractionState::AwaitingPlacement(id) | InteractionState::Editing(id) => Some(*id),
        }
    }

    /// State after a click landed on the body.
    pub fn after_hit(self) -> Self {
        match self {
            InteractionState::AwaitingPlacement(id) => InteractionState::Editing(id),
            other => other,
        }
    }

    /// State after `removed` stopped existing.
    pub fn without(self, removed: DecalId) -> Self {
        if self.target() == Some(removed) {
            InteractionState::Idle
        } else {
            self
        }
    }
}

/// Orientation whose forward (+Z) axis is `normal`, with `spin` applied
/// about that axis. Stored as XYZ Euler angles (R = Rx * Ry * Rz).
pub fn surface_rotation(normal: Vec3, spin: f32) -> [f32; 3] {
    let n = normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return [0.0, 0.0, spin];
    }
    let y = n.x.clamp(-1.0, 1.0).asin();
    let x = (-n.y).atan2(n.z);
    [x, y, spin]
}

pub fn rotation_quat(rotation: [f32; 3]) -> Quat {
    Quat::from_rotation_x(rotation[0])
        * Quat::from_rotation_y(rotation[1])
        * Quat::from_rotation_z(rotation[2])
}

struct DecalInstance {
    mesh: DecalMesh,
    _texture: Rc<Texture>,
}

pub struct DecalEngine<S: SceneGraph> {
    store: SceneStore,
    scene: S,
    camera: CameraController,
    settings: DecalSettings,
    textures: TextureCache,
    instances: HashMap<DecalId, DecalInstance>,
    state: InteractionState,
}

impl<S: SceneGraph> DecalEngine<S> {
    pub fn new(
        store: SceneStore,
        scene: S,
        camera: CameraController,
        settings: DecalSettings,
    ) -> Self {
        Self {
            store,
            scene,
            camera,
            settings,
            textures: TextureCache::new(),
            instances: HashMap::new(),
            state: InteractionState::Idle,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: CameraController) {
        self.camera = camera;
    }

    pub fn has_instance(&self, id: DecalId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Stores a new decal and arms placement mode for it. Nothing is built
    /// until the decal lands on the body.
    pub fn upload_decal(&mut self, file_name: &str, bytes: &[u8]) -> Result<Decal, DecalError> {
        let texture = self.textures.load(file_name, bytes)?;
        self.store.store_image(&texture.key, bytes);
        let opacity = self.settings.default_opacity;
        let decal = self
            .store
            .insert_decal(|id| Decal::uploaded(id, &texture.key, file_name, opacity));
        log::info!("Uploaded {} as {}", file_name, decal.id);
        self.state = InteractionState::AwaitingPlacement(decal.id);
        Ok(decal)
    }

    pub fn begin_placement(&mut self, id: DecalId) -> Result<(), DecalError> {
        self.require(id)?;
        self.state = InteractionState::AwaitingPlacement(id);
        Ok(())
    }

    pub fn select_decal(&mut self, id: DecalId) -> Result<(), DecalError> {
        self.require(id)?;
        self.state = InteractionState::Editing(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Projects a click onto the body and moves the targeted decal there.
    /// Misses and clicks with nothing targeted change nothing.
    pub fn handle_click(
        &mut self,
        screen_x: f32,
        screen_y: f32,
        viewport: Viewport,
    ) -> Option<Decal> {
        let id = self.state.target()?;
        let Some(current) = self.store.decal(id) else {
            log::warn!("Click targeted {} which no longer exists", id);
            self.state = InteractionState::Idle;
            return None;
        };
        let ndc = viewport.to_ndc(screen_x, screen_y)?;
        let ray = self.camera.screen_ray(ndc, viewport.aspect());
        let Some(body) = self.scene.body_mesh() else {
            log::warn!("No body mesh to place {} on", id);
            return None;
        };
        let Some(hit) = raycast_mesh(body, &ray) else {
            log::debug!("Click at ({}, {}) missed the body", screen_x, screen_y);
            return None;
        };

        let rotation = surface_rotation(hit.face_normal, current.spin());
        let phase = match current.phase {
            DecalPhase::Uploaded => DecalPhase::Placed,
            _ => DecalPhase::Repositioned,
        };
        let placed = self.store.update_decal(id, |decal| {
            decal.position = hit.point.to_array();
            decal.rotation = rotation;
            decal.normal = hit.face_normal.to_array();
            decal.phase = phase;
        })?;
        self.regenerate(id);
        self.state = self.state.after_hit();
        log::info!("{} {:?} at {:?}", id, phase, placed.position);
        Some(placed)
    }

    /// Applies editor changes. Scale and spin rebuild the geometry; opacity
    /// and image swaps only touch the material.
    pub fn edit_decal(&mut self, id: DecalId, edit: DecalEdit) -> Result<Decal, DecalError> {
        edit.validate()?;
        self.require(id)?;
        let texture = match &edit.image {
            Some(image) => {
                let texture = self.textures.load(&image.file_name, &image.bytes)?;
                self.store.store_image(&texture.key, &image.bytes);
                Some(texture)
            }
            None => None,
        };
        let updated = self
            .store
            .update_decal(id, |decal| {
                if let Some(scale) = edit.scale {
                    decal.scale = scale;
                }
                if let Some(opacity) = edit.opacity {
                    decal.opacity = opacity;
                }
                if let Some(spin) = edit.rotation_z {
                    decal.rotation[2] = spin;
                }
                if let (Some(texture), Some(image)) = (&texture, &edit.image) {
                    decal.image_url = texture.key.clone();
                    decal.file_name = image.file_name.clone();
                }
                if decal.phase != DecalPhase::Uploaded {
                    decal.phase = DecalPhase::Edited;
                }
            })
            .ok_or(DecalError::UnknownDecal(id))?;

        if edit.changes_geometry() {
            self.regenerate(id);
        } else {
            self.refresh_material(&updated);
        }
        if texture.is_some() {
            self.prune_textures();
        }
        Ok(updated)
    }

    pub fn delete_decal(&mut self, id: DecalId) -> Result<Decal, DecalError> {
        let removed = self
            .store
            .remove_decal(id)
            .ok_or(DecalError::UnknownDecal(id))?;
        self.dispose(id);
        self.state = self.state.without(id);
        self.prune_textures();
        log::info!("Deleted {}", id);
        Ok(removed)
    }

    pub fn clear_decals(&mut self) -> usize {
        let removed = self.store.clear_decals();
        for id in &removed {
            self.dispose(*id);
        }
        self.state = InteractionState::Idle;
        self.prune_textures();
        log::info!("Cleared {} decals", removed.len());
        removed.len()
    }

    /// Throws away every render object and rebuilds from the decal records
    /// and the scene's stored images. Returns how many decals got geometry.
    pub fn rebuild_all(&mut self) -> usize {
        let ids: Vec<DecalId> = self.instances.keys().copied().collect();
        for id in ids {
            self.dispose(id);
        }
        let decals = self.store.decals();
        decals
            .iter()
            .filter(|decal| self.regenerate(decal.id))
            .count()
    }

    /// Frees every render object and texture. Decal records stay in the store.
    pub fn teardown(&mut self) {
        let ids: Vec<DecalId> = self.instances.keys().copied().collect();
        for id in ids {
            self.dispose(id);
        }
        self.textures.clear();
        self.state = InteractionState::Idle;
    }

    fn require(&self, id: DecalId) -> Result<Decal, DecalError> {
        self.store.decal(id).ok_or(DecalError::UnknownDecal(id))
    }

    /// Cached texture for a decal, decoding the scene's stored image on a miss.
    fn texture_for(&mut self, decal: &Decal) -> Option<Rc<Texture>> {
        if let Some(texture) = self.textures.get(&decal.image_url) {
            return Some(texture);
        }
        let Some(bytes) = self.store.image_bytes(&decal.image_url) else {
            log::warn!("{} references missing image {}", decal.id, decal.image_url);
            return None;
        };
        match self.textures.load(&decal.file_name, &bytes) {
            Ok(texture) if texture.key == decal.image_url => Some(texture),
            Ok(texture) => {
                log::warn!(
                    "{} image content hashes to {}, expected {}",
                    decal.id,
                    texture.key,
                    decal.image_url
                );
                None
            }
            Err(err) => {
                log::warn!("{}: {}", decal.id, err);
                None
            }
        }
    }

    /// Rebuilds the projected geometry of one decal, replacing (and freeing)
    /// whatever was built before. Decals still waiting for placement get none.
    fn regenerate(&mut self, id: DecalId) -> bool {
        let Some(decal) = self.store.decal(id) else {
            return false;
        };
        if decal.phase == DecalPhase::Uploaded {
            self.dispose(id);
            return false;
        }
        let Some(texture) = self.texture_for(&decal) else {
            return false;
        };
        let Some(body) = self.scene.body_mesh() else {
            log::warn!("No body mesh; {} not built", id);
            return false;
        };
        let geometry = project(
            body,
            Vec3::from(decal.position),
            rotation_quat(decal.rotation),
            self.settings.projection_size(decal.scale),
            ProjectOptions {
                reject_backfaces: self.settings.reject_backfaces,
            },
        );
        log::debug!("{} projected to {} triangles", id, geometry.triangle_count());

        self.dispose(id);
        let mesh = DecalMesh {
            geometry,
            texture_key: texture.key.clone(),
            opacity: decal.opacity,
        };
        self.scene.attach_decal(id, &mesh);
        self.instances.insert(
            id,
            DecalInstance {
                mesh,
                _texture: texture,
            },
        );
        true
    }

    fn refresh_material(&mut self, decal: &Decal) {
        if !self.instances.contains_key(&decal.id) {
            return;
        }
        let Some(texture) = self.texture_for(decal) else {
            return;
        };
        let Some(instance) = self.instances.get_mut(&decal.id) else {
            return;
        };
        instance.mesh.opacity = decal.opacity;
        instance.mesh.texture_key = texture.key.clone();
        instance._texture = texture;
        self.scene
            .update_decal_material(decal.id, &instance.mesh.texture_key, decal.opacity);
    }

    fn dispose(&mut self, id: DecalId) {
        if self.instances.remove(&id).is_some() {
            self.scene.detach_decal(id);
        }
    }

    fn prune_textures(&mut self) {
        let decals = self.store.decals();
        let dropped = self
            .textures
            .prune(decals.iter().map(|decal| decal.image_url.as_str()));
        if dropped > 0 {
            log::debug!("Released {} unused textures", dropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::textures::tiny_png;
    use super::*;
    use crate::catalog::Catalog;
    use crate::render::{HeadlessScene, Mesh};
    use std::f32::consts::FRAC_PI_4;

    const VIEW: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        width: 800.0,
        height: 800.0,
    };

    fn engine(body: Mesh) -> DecalEngine<HeadlessScene> {
        let store = SceneStore::new(Rc::new(Catalog::builtin().unwrap()));
        DecalEngine::new(
            store,
            HeadlessScene::new(Some(body)),
            CameraController::look_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]),
            DecalSettings::default(),
        )
    }

    #[test]
    fn surface_rotation_points_forward_along_normal() {
        for normal in [
            Vec3::Z,
            Vec3::X,
            Vec3::NEG_Y,
            Vec3::new(0.3, -0.5, 0.8).normalize(),
            Vec3::new(-0.6, 0.2, -0.7).normalize(),
        ] {
            for spin in [0.0, FRAC_PI_4, -2.0] {
                let rotation = surface_rotation(normal, spin);
                let forward = rotation_quat(rotation) * Vec3::Z;
                assert!((forward - normal).length() < 1e-4, "{normal:?} {spin}");
                assert_eq!(rotation[2], spin);
            }
        }
    }

    #[test]
    fn upload_arms_placement_and_click_places() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let decal = engine.upload_decal("logo.png", &tiny_png([9, 9, 9, 255])).unwrap();
        assert_eq!(engine.state(), InteractionState::AwaitingPlacement(decal.id));
        assert_eq!(decal.phase, DecalPhase::Uploaded);
        assert!(decal.image_url.starts_with("sha256:"));

        let placed = engine.handle_click(430.0, 380.0, VIEW).unwrap();
        assert_eq!(placed.phase, DecalPhase::Placed);
        assert!(placed.position[2].abs() < 1e-5);
        assert_eq!(placed.normal, [0.0, 0.0, 1.0]);
        assert_eq!(engine.state(), InteractionState::Editing(decal.id));
        assert!(engine.scene().attached()[&decal.id].vertex_count > 0);
    }

    #[test]
    fn miss_is_a_no_op() {
        let mut engine = engine(Mesh::plane(0.5, 0.5, 1));
        let decal = engine.upload_decal("logo.png", &tiny_png([1, 2, 3, 255])).unwrap();
        assert!(engine.handle_click(5.0, 5.0, VIEW).is_none());
        assert_eq!(engine.state(), InteractionState::AwaitingPlacement(decal.id));
        assert_eq!(engine.store.decal(decal.id).unwrap(), decal);
    }

    #[test]
    fn click_while_idle_does_nothing() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        engine.upload_decal("logo.png", &tiny_png([1, 2, 3, 255])).unwrap();
        engine.clear_selection();
        assert!(engine.handle_click(400.0, 400.0, VIEW).is_none());
    }

    #[test]
    fn spin_survives_repositioning() {
        let mut engine = engine(Mesh::cylinder(1.0, 3.0, 64));
        let decal = engine.upload_decal("flag.png", &tiny_png([200, 0, 0, 255])).unwrap();
        engine.handle_click(403.0, 397.0, VIEW).unwrap();

        let edited = engine
            .edit_decal(
                decal.id,
                DecalEdit {
                    rotation_z: Some(FRAC_PI_4),
                    ..DecalEdit::default()
                },
            )
            .unwrap();
        assert_eq!(edited.phase, DecalPhase::Edited);

        let moved = engine.handle_click(520.0, 397.0, VIEW).unwrap();
        assert_eq!(moved.phase, DecalPhase::Repositioned);
        assert_eq!(moved.rotation[2], FRAC_PI_4);
        assert!(moved.rotation[1] > 0.1);
        let forward = rotation_quat(moved.rotation) * Vec3::Z;
        assert!((forward - Vec3::from(moved.normal)).length() < 1e-4);
        assert_eq!(engine.state(), InteractionState::Editing(decal.id));
    }

    #[test]
    fn opacity_edit_only_touches_material() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let decal = engine.upload_decal("logo.png", &tiny_png([5, 5, 5, 255])).unwrap();
        engine.handle_click(410.0, 385.0, VIEW).unwrap();
        let attaches = engine.scene().attach_calls();

        engine
            .edit_decal(
                decal.id,
                DecalEdit {
                    opacity: Some(0.25),
                    ..DecalEdit::default()
                },
            )
            .unwrap();
        assert_eq!(engine.scene().attach_calls(), attaches);
        assert_eq!(engine.scene().attached()[&decal.id].opacity, 0.25);

        engine
            .edit_decal(
                decal.id,
                DecalEdit {
                    scale: Some([2.0, 1.0, 1.0]),
                    ..DecalEdit::default()
                },
            )
            .unwrap();
        assert_eq!(engine.scene().attach_calls(), attaches + 1);
        assert_eq!(engine.scene().detach_calls(), attaches);
    }

    #[test]
    fn invalid_edits_are_rejected() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let decal = engine.upload_decal("logo.png", &tiny_png([5, 5, 5, 255])).unwrap();
        let too_opaque = DecalEdit {
            opacity: Some(1.5),
            ..DecalEdit::default()
        };
        assert!(matches!(
            engine.edit_decal(decal.id, too_opaque),
            Err(DecalError::InvalidEdit(_))
        ));
        let flat = DecalEdit {
            scale: Some([1.0, 0.0, 1.0]),
            ..DecalEdit::default()
        };
        assert!(engine.edit_decal(decal.id, flat).is_err());
        assert!(matches!(
            engine.edit_decal(DecalId(99), DecalEdit::default()),
            Err(DecalError::UnknownDecal(_))
        ));
    }

    #[test]
    fn image_swap_releases_unused_texture() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let decal = engine.upload_decal("a.png", &tiny_png([1, 1, 1, 255])).unwrap();
        engine.handle_click(410.0, 385.0, VIEW).unwrap();
        let swapped = engine
            .edit_decal(
                decal.id,
                DecalEdit {
                    image: Some(DecalImage {
                        file_name: "b.png".to_string(),
                        bytes: tiny_png([2, 2, 2, 255]),
                    }),
                    ..DecalEdit::default()
                },
            )
            .unwrap();
        assert_ne!(swapped.image_url, decal.image_url);
        assert_eq!(swapped.file_name, "b.png");
        assert_eq!(engine.textures().len(), 1);
        assert!(engine.textures().contains(&swapped.image_url));
        assert_eq!(engine.scene().attached()[&decal.id].texture_key, swapped.image_url);
    }

    #[test]
    fn shared_upload_shares_texture() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let png = tiny_png([7, 7, 7, 255]);
        let first = engine.upload_decal("a.png", &png).unwrap();
        let second = engine.upload_decal("a-again.png", &png).unwrap();
        assert_eq!(first.image_url, second.image_url);
        assert_eq!(engine.textures().len(), 1);

        engine.delete_decal(first.id).unwrap();
        assert_eq!(engine.textures().len(), 1);
        engine.delete_decal(second.id).unwrap();
        assert!(engine.textures().is_empty());
    }

    #[test]
    fn delete_clears_targeting_state() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let decal = engine.upload_decal("a.png", &tiny_png([1, 1, 1, 255])).unwrap();
        engine.delete_decal(decal.id).unwrap();
        assert_eq!(engine.state(), InteractionState::Idle);
        assert!(!engine.has_instance(decal.id));
        assert!(engine.scene().attached().is_empty());
        assert!(matches!(
            engine.delete_decal(decal.id),
            Err(DecalError::UnknownDecal(_))
        ));
    }

    #[test]
    fn rebuild_restores_cache_from_records() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let a = engine.upload_decal("a.png", &tiny_png([1, 1, 1, 255])).unwrap();
        engine.handle_click(410.0, 385.0, VIEW).unwrap();
        let b = engine.upload_decal("b.png", &tiny_png([2, 2, 2, 255])).unwrap();
        engine.handle_click(300.0, 300.0, VIEW).unwrap();
        let before = engine.scene().attached().clone();

        assert_eq!(engine.rebuild_all(), 2);
        assert_eq!(engine.scene().attached(), &before);
        assert!(engine.has_instance(a.id) && engine.has_instance(b.id));
    }

    #[test]
    fn unplaced_decal_has_no_geometry() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        let decal = engine.upload_decal("logo.png", &tiny_png([3, 3, 3, 255])).unwrap();
        assert!(!engine.has_instance(decal.id));
        assert_eq!(engine.scene().attach_calls(), 0);

        engine
            .edit_decal(
                decal.id,
                DecalEdit {
                    scale: Some([2.0, 2.0, 1.0]),
                    ..DecalEdit::default()
                },
            )
            .unwrap();
        assert!(!engine.has_instance(decal.id));
        assert_eq!(engine.rebuild_all(), 0);
    }

    #[test]
    fn teardown_and_restore_rebuild_from_stored_images() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        engine.upload_decal("a.png", &tiny_png([1, 1, 1, 255])).unwrap();
        engine.handle_click(410.0, 385.0, VIEW).unwrap();
        engine.upload_decal("b.png", &tiny_png([2, 2, 2, 255])).unwrap();
        engine.handle_click(300.0, 300.0, VIEW).unwrap();
        let before = engine.scene().attached().clone();

        engine.teardown();
        assert!(engine.textures().is_empty());
        assert_eq!(engine.rebuild_all(), 2);
        assert_eq!(engine.scene().attached(), &before);
        assert_eq!(engine.textures().len(), 2);

        let saved = serde_json::to_string(&engine.store.snapshot()).unwrap();
        let restored = SceneStore::with_state(
            engine.store.catalog_handle(),
            serde_json::from_str(&saved).unwrap(),
        );
        let mut fresh = DecalEngine::new(
            restored,
            HeadlessScene::new(Some(Mesh::plane(4.0, 4.0, 4))),
            CameraController::look_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]),
            DecalSettings::default(),
        );
        assert_eq!(fresh.rebuild_all(), 2);
        assert_eq!(fresh.scene().attached(), &before);
    }

    #[test]
    fn clear_and_teardown_free_everything() {
        let mut engine = engine(Mesh::plane(4.0, 4.0, 4));
        engine.upload_decal("a.png", &tiny_png([1, 1, 1, 255])).unwrap();
        engine.upload_decal("b.png", &tiny_png([2, 2, 2, 255])).unwrap();
        engine.teardown();
        assert!(engine.scene().attached().is_empty());
        assert!(engine.textures().is_empty());
        assert_eq!(engine.store.decals().len(), 2);

        assert_eq!(engine.clear_decals(), 2);
        assert!(engine.store.decals().is_empty());
        assert_eq!(engine.state(), InteractionState::Idle);
    }
}
