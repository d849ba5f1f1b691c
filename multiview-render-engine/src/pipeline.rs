//! Per-asset multi-view render pipeline over a scene host

use crate::bounds::Aabb;
use crate::camera::{CameraRig, view_poses};
use crate::compositor::{OutputGraph, canonical_slot_paths, normalize_frame_suffix};
use crate::error::{RenderError, Result};
use crate::metadata::{ViewRecord, write_cameras};
use crate::scene::{AreaLight, SceneHost};
use constants::camera::{FOCAL_LENGTH_MM, SENSOR_WIDTH_MM};
use constants::layout::VIEWS_DIR;
use constants::render_settings::{
    AREA_LIGHT_ENERGY, AREA_LIGHT_HEIGHT, AREA_LIGHT_SCALE, RESOLUTION_X, RESOLUTION_Y,
    TRACK_TARGET_NAME,
};
use glam::DVec3;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stages walked in order for every asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reset,
    Load,
    Normalize,
    Light,
    CameraRig,
    Compositor,
    Render,
    SerializeCameraMetadata,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Root receiving `{uid}/views/`.
    pub output_dir: PathBuf,
    pub num_images: usize,
    pub camera_distance: f64,
    pub rig: CameraRig,
}

impl PipelineSettings {
    pub fn new(output_dir: &Path, num_images: usize, camera_distance: f64) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            num_images,
            camera_distance,
            rig: CameraRig {
                focal_length_mm: FOCAL_LENGTH_MM,
                sensor_width_mm: SENSOR_WIDTH_MM,
                resolution: (RESOLUTION_X, RESOLUTION_Y),
            },
        }
    }
}

/// Outcome of one successful asset render.
#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub uid: String,
    pub views: usize,
    pub views_dir: PathBuf,
}

/// Object UID: the file name up to its first `.`.
pub fn object_uid(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((uid, _)) => uid.to_string(),
        None => name,
    }
}

/// Scales every top-level object so the largest extent is 1, then recenters
/// on the origin using the bounds recomputed after scaling.
pub fn normalize_scene<H: SceneHost>(host: &mut H) -> Result<Aabb> {
    let bounds = host.mesh_world_bounds().ok_or(RenderError::EmptyScene)?;
    let max_dimension = bounds.max_dimension();
    if max_dimension <= 0.0 {
        return Err(RenderError::EmptyScene);
    }

    let roots = host.root_objects();
    let scale = 1.0 / max_dimension;
    for &id in &roots {
        host.scale_object(id, scale)?;
    }
    host.update();

    let bounds = host.mesh_world_bounds().ok_or(RenderError::EmptyScene)?;
    let offset = -bounds.center();
    for &id in &roots {
        host.translate_object(id, offset)?;
    }
    host.update();

    let normalized = host.mesh_world_bounds().ok_or(RenderError::EmptyScene)?;
    log::debug!(
        "Normalized {} root objects: scale {:.4}, offset {}",
        roots.len(),
        scale,
        offset
    );
    Ok(normalized)
}

pub struct MultiViewPipeline<H: SceneHost> {
    host: H,
    settings: PipelineSettings,
}

impl<H: SceneHost> MultiViewPipeline<H> {
    pub fn new(host: H, settings: PipelineSettings) -> Self {
        Self { host, settings }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn enter(&self, stage: Stage, uid: &str) {
        log::debug!("[{}] {}", uid, stage);
    }

    /// Renders every view of one asset and writes its camera metadata.
    pub fn run(&mut self, object_path: &Path) -> Result<RenderSummary> {
        let uid = object_uid(object_path);
        let views_dir = self.settings.output_dir.join(&uid).join(VIEWS_DIR);

        self.enter(Stage::Reset, &uid);
        self.host.reset()?;

        self.enter(Stage::Load, &uid);
        self.host.import_mesh(object_path)?;

        self.enter(Stage::Normalize, &uid);
        normalize_scene(&mut self.host)?;

        self.enter(Stage::Light, &uid);
        self.host.remove_default_light();
        self.host.add_area_light(AreaLight {
            energy: AREA_LIGHT_ENERGY,
            location: DVec3::new(0.0, 0.0, AREA_LIGHT_HEIGHT),
            scale: AREA_LIGHT_SCALE,
        });

        self.enter(Stage::CameraRig, &uid);
        let target = self.host.add_empty(TRACK_TARGET_NAME, DVec3::ZERO);
        self.host.configure_camera(self.settings.rig, target)?;

        self.enter(Stage::Compositor, &uid);
        let graph = OutputGraph::dataset(&views_dir);
        self.host.configure_outputs(graph.clone());

        let poses = view_poses(self.settings.num_images);
        self.enter(Stage::Render, &uid);

        let pb = ProgressBar::new(poses.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} views ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message(format!("Rendering {}", uid));

        for pose in &poses {
            self.host
                .set_camera_location(pose.position(self.settings.camera_distance));
            let targets = graph.targets(pose.view_id);
            let rendered = self.host.render(&targets)?;

            let (depth, mask) = canonical_slot_paths(&views_dir, pose.view_id);
            normalize_frame_suffix(&rendered.depth, &depth)?;
            normalize_frame_suffix(&rendered.mask, &mask)?;
            pb.inc(1);
        }
        pb.finish_with_message(format!("Rendered {}", uid));

        self.enter(Stage::SerializeCameraMetadata, &uid);
        let intrinsics = self.settings.rig.intrinsics();
        let mut records = Vec::with_capacity(poses.len());
        for pose in &poses {
            let position = pose.position(self.settings.camera_distance);
            self.host.set_camera_location(position);
            self.host.update();
            let matrix = self.host.camera_world_matrix();
            records.push(ViewRecord::new(
                pose,
                self.settings.camera_distance,
                position,
                &matrix,
                &intrinsics,
            ));
        }
        write_cameras(&views_dir, &records)?;

        log::info!(
            "Rendered {} views of {} into {}",
            poses.len(),
            uid,
            views_dir.display()
        );
        Ok(RenderSummary {
            uid,
            views: poses.len(),
            views_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::track_to;
    use crate::compositor::FrameBuffers;
    use crate::metadata::read_cameras;
    use crate::raster::RasterHost;
    use crate::scene::{ObjectId, RenderTargets, RenderedFiles};
    use crate::settings::Engine;
    use approx::assert_abs_diff_eq;
    use constants::layout::{depth_file_name, mask_file_name, rgb_file_name};
    use glam::DMat4;
    use std::fs;
    use tempfile::tempdir;

    /// Records calls and writes placeholder outputs with frame suffixes.
    #[derive(Default)]
    struct MockHost {
        calls: Vec<&'static str>,
        boxes: Vec<Aabb>,
        graph: Option<OutputGraph>,
        camera: DVec3,
        matrix: DMat4,
        fail_import: bool,
    }

    impl MockHost {
        fn bounds(&self) -> Option<Aabb> {
            let mut all = Aabb::new();
            for b in &self.boxes {
                all.merge(b);
            }
            (!all.is_empty()).then_some(all)
        }
    }

    impl SceneHost for MockHost {
        fn reset(&mut self) -> Result<()> {
            self.calls.push("reset");
            self.boxes.clear();
            Ok(())
        }

        fn import_mesh(&mut self, path: &Path) -> Result<Vec<ObjectId>> {
            self.calls.push("import");
            if self.fail_import {
                return Err(RenderError::UnsupportedFormat(path.to_path_buf()));
            }
            self.boxes = vec![
                Aabb::from_points([DVec3::new(2.0, 2.0, 2.0), DVec3::new(4.0, 3.0, 2.5)]),
                Aabb::from_points([DVec3::new(5.0, 2.0, 2.0), DVec3::new(6.0, 2.5, 3.0)]),
            ];
            Ok(vec![0, 1])
        }

        fn mesh_world_bounds(&self) -> Option<Aabb> {
            self.bounds()
        }

        fn root_objects(&self) -> Vec<ObjectId> {
            (0..self.boxes.len()).collect()
        }

        fn scale_object(&mut self, id: ObjectId, factor: f64) -> Result<()> {
            let b = &mut self.boxes[id];
            *b = Aabb::from_points([b.min * factor, b.max * factor]);
            Ok(())
        }

        fn translate_object(&mut self, id: ObjectId, offset: DVec3) -> Result<()> {
            let b = &mut self.boxes[id];
            *b = Aabb::from_points([b.min + offset, b.max + offset]);
            Ok(())
        }

        fn update(&mut self) {
            self.matrix = track_to(self.camera, DVec3::ZERO);
        }

        fn remove_default_light(&mut self) {
            self.calls.push("remove_light");
        }

        fn add_area_light(&mut self, _light: AreaLight) -> ObjectId {
            self.calls.push("area_light");
            10
        }

        fn add_empty(&mut self, _name: &str, _location: DVec3) -> ObjectId {
            self.calls.push("empty");
            11
        }

        fn configure_camera(&mut self, _rig: CameraRig, target: ObjectId) -> Result<()> {
            assert_eq!(target, 11);
            self.calls.push("camera");
            Ok(())
        }

        fn set_camera_location(&mut self, location: DVec3) {
            self.camera = location;
        }

        fn camera_world_matrix(&self) -> DMat4 {
            self.matrix
        }

        fn configure_outputs(&mut self, graph: OutputGraph) {
            self.calls.push("outputs");
            self.graph = Some(graph);
        }

        fn render(&mut self, targets: &RenderTargets) -> Result<RenderedFiles> {
            self.calls.push("render");
            let graph = self.graph.as_ref().ok_or(RenderError::OutputsNotConfigured)?;
            fs::create_dir_all(&graph.base_dir).unwrap();

            let depth = graph.slot_path(&targets.depth_slot, &graph.depth);
            let mask = graph.slot_path(&targets.mask_slot, &graph.mask);
            for path in [&targets.rgb_path, &depth, &mask] {
                fs::write(path, b"img").unwrap();
            }
            Ok(RenderedFiles {
                rgb: targets.rgb_path.clone(),
                depth,
                mask,
            })
        }
    }

    #[test]
    fn uid_is_file_name_before_first_dot() {
        assert_eq!(object_uid(Path::new("/tmp/abc123.glb")), "abc123");
        assert_eq!(object_uid(Path::new("x/abc.tar.gz")), "abc");
        assert_eq!(object_uid(Path::new("noext")), "noext");
    }

    #[test]
    fn stages_run_in_order_and_suffixes_are_removed() {
        let out = tempdir().unwrap();
        let settings = PipelineSettings::new(out.path(), 64, 1.5);
        let mut pipeline = MultiViewPipeline::new(MockHost::default(), settings);

        let summary = pipeline.run(Path::new("/data/asset01.glb")).unwrap();

        assert_eq!(summary.uid, "asset01");
        assert_eq!(summary.views, 16);
        assert_eq!(summary.views_dir, out.path().join("asset01").join("views"));

        let calls = &pipeline.host().calls;
        assert_eq!(
            &calls[..7],
            ["reset", "import", "remove_light", "area_light", "empty", "camera", "outputs"]
        );
        assert_eq!(calls.iter().filter(|c| **c == "render").count(), 16);

        for view in 0..16 {
            assert!(summary.views_dir.join(rgb_file_name(view)).exists());
            assert!(summary.views_dir.join(depth_file_name(view)).exists());
            assert!(summary.views_dir.join(mask_file_name(view)).exists());
        }
        let leftovers: Vec<_> = fs::read_dir(&summary.views_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("0001"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn load_failure_aborts_before_any_output() {
        let out = tempdir().unwrap();
        let host = MockHost {
            fail_import: true,
            ..Default::default()
        };
        let mut pipeline = MultiViewPipeline::new(host, PipelineSettings::new(out.path(), 16, 1.5));

        let err = pipeline.run(Path::new("chair.fbx")).unwrap_err();

        assert!(matches!(err, RenderError::UnsupportedFormat(_)));
        assert_eq!(pipeline.host().calls, ["reset", "import"]);
        assert!(!out.path().join("chair").exists());
    }

    #[test]
    fn empty_scene_fails_normalization() {
        let mut host = MockHost::default();
        assert!(matches!(
            normalize_scene(&mut host),
            Err(RenderError::EmptyScene)
        ));
    }

    #[test]
    fn normalization_fits_unit_box_at_origin() {
        let mut host = MockHost::default();
        host.import_mesh(Path::new("two_roots.glb")).unwrap();

        let bounds = normalize_scene(&mut host).unwrap();

        assert_abs_diff_eq!(bounds.max_dimension(), 1.0, epsilon = 1e-9);
        assert!(bounds.center().abs_diff_eq(DVec3::ZERO, 1e-9));
    }

    #[test]
    fn raster_host_renders_unit_cube_end_to_end() {
        let work = tempdir().unwrap();
        let object = work.path().join("cube.obj");
        fs::write(
            &object,
            "o cube\n\
             v -0.5 -0.5 -0.5\nv 0.5 -0.5 -0.5\nv 0.5 0.5 -0.5\nv -0.5 0.5 -0.5\n\
             v -0.5 -0.5 0.5\nv 0.5 -0.5 0.5\nv 0.5 0.5 0.5\nv -0.5 0.5 0.5\n\
             f 1 2 3 4\nf 5 6 7 8\nf 1 2 6 5\nf 2 3 7 6\nf 3 4 8 7\nf 4 1 5 8\n",
        )
        .unwrap();
        let output = work.path().join("renders");

        let mut pipeline = MultiViewPipeline::new(
            RasterHost::new(Engine::Cycles),
            PipelineSettings::new(&output, 16, 1.5),
        );
        let summary = pipeline.run(&object).unwrap();
        let views = &summary.views_dir;

        assert_eq!(summary.uid, "cube");
        let files: Vec<String> = fs::read_dir(views)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 16 * 3 + 1);
        assert!(files.iter().all(|name| !name.contains("0001")));

        let records = read_cameras(views).unwrap();
        assert_eq!(records.len(), 16);
        assert!(records.iter().enumerate().all(|(i, r)| r.view_id == i));
        assert_abs_diff_eq!(records[0].position[0], 1.299, epsilon = 1e-3);
        assert_abs_diff_eq!(records[0].position[1], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(records[0].position[2], 0.75, epsilon = 1e-6);
        assert_eq!(records[0].focal_length, [280.0, 280.0]);
        assert_eq!(records[0].principal_point, [128.0, 128.0]);

        // Target sits one unit along the view direction, toward the origin.
        let position = DVec3::from_array(records[0].position);
        let target = DVec3::from_array(records[0].target);
        assert!((target - position).abs_diff_eq(-position.normalize(), 1e-6));

        let mask = image::open(views.join(mask_file_name(0))).unwrap().to_luma8();
        assert_eq!(mask.dimensions(), (256, 256));
        assert!(mask.get_pixel(128, 128).0[0] > 200);
        assert!(mask.get_pixel(0, 0).0[0] < 50);

        let depth = image::open(views.join(depth_file_name(0))).unwrap();
        assert_eq!((depth.width(), depth.height()), (256, 256));
        let depth = depth.as_luma16().unwrap();
        assert_eq!(depth.get_pixel(0, 0).0[0], u16::MAX);
        assert!(depth.get_pixel(128, 128).0[0] < u16::MAX);
    }

    #[test]
    fn frame_buffers_default_to_transparent_film() {
        let film = FrameBuffers::new(4, 4);
        assert!(film.alpha.iter().all(|&a| a == 0.0));
        assert!(film.depth.iter().all(|d| d.is_infinite()));
    }
}
