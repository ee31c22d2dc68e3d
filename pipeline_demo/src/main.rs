//! Pipeline demo application
//!
//! Renders a randomly generated scene through the frame render pipeline on
//! the headless recording backend and logs what every frame submitted.
//!
//! ```text
//! pipeline_demo                                 # every pipeline variant
//! pipeline_demo --config pipeline.toml          # one renderer from a config file
//! pipeline_demo --create-asset Asset.toml lit   # write a default pipeline asset
//! pipeline_demo --frames 10 --seed 7
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scratch_pipeline::foundation::logging;
use scratch_pipeline::prelude::*;
use scratch_pipeline::render::Submission;

const DEFAULT_FRAMES: u64 = 3;
const DEFAULT_SEED: u64 = 42;
const OBJECT_COUNT: usize = 32;
const LIGHT_COUNT: usize = 12;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    create_asset: Option<(String, PipelineKind)>,
    frames: Option<u64>,
    seed: Option<u64>,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = Self::default();
        let mut iter = std::env::args().skip(1).peekable();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?),
                "--create-asset" => {
                    let path = iter.next().ok_or("--create-asset needs a path")?;
                    let kind = match iter.next_if(|next| !next.starts_with("--")) {
                        Some(kind) => kind.parse()?,
                        None => PipelineKind::Clear,
                    };
                    args.create_asset = Some((path, kind));
                }
                "--frames" => {
                    let value = iter.next().ok_or("--frames needs a count")?;
                    args.frames = Some(value.parse().map_err(|e| format!("--frames: {}", e))?);
                }
                "--seed" => {
                    let value = iter.next().ok_or("--seed needs a number")?;
                    args.seed = Some(value.parse().map_err(|e| format!("--seed: {}", e))?);
                }
                other => return Err(format!("Unknown argument '{}'", other)),
            }
        }
        Ok(args)
    }
}

/// Random scene plus the cameras that look at it
struct DemoScene {
    scene: Scene,
    cameras: Vec<Camera>,
}

impl DemoScene {
    fn generate(materials: &MaterialLibrary, seed: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let standard = materials.find_by_name("Standard").ok_or("Standard material missing")?;
        let glass = materials.find_by_name("Glass").ok_or("Glass material missing")?;

        let mut scene = Scene::new();
        for i in 0..OBJECT_COUNT {
            let position = Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-4.0..4.0),
                rng.gen_range(-40.0..-2.0),
            );
            // Roughly one in four objects is transparent
            let material = if rng.gen_bool(0.25) { glass } else { standard };
            scene.add_object(RenderObject::new(
                format!("object {}", i),
                Transform::from_position(position),
                BoundingSphere::new(Vec3::zeros(), rng.gen_range(0.5..2.0)),
                material,
            ));
        }

        scene.add_light(Light::directional(Vec3::new(-0.3, -1.0, -0.2), Color::WHITE, 1.0));
        for _ in 1..LIGHT_COUNT {
            let position = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(0.0..8.0),
                rng.gen_range(-40.0..0.0),
            );
            let color = Color::rgb(rng.gen(), rng.gen(), rng.gen());
            let range = rng.gen_range(2.0..12.0);
            let light = match rng.gen_range(0..4) {
                0 => Light::spot(position, Vec3::new(0.0, -1.0, 0.0), color, 2.0, range),
                _ => Light::point(position, color, 1.5, range),
            };
            scene.add_light(light);
        }

        let main = Camera::perspective("main", 1280, 720, 60.0, 0.1, 100.0).looking_at(
            Vec3::new(0.0, 2.0, 5.0),
            Vec3::new(0.0, 0.0, -20.0),
            Vec3::y(),
        );
        let mut minimap = Camera::perspective("minimap", 256, 256, 90.0, 1.0, 200.0)
            .looking_at(Vec3::new(0.0, 60.0, -20.0), Vec3::new(0.0, 0.0, -20.0), Vec3::new(0.0, 0.0, -1.0))
            .with_target(CameraTarget::Offscreen("minimap".to_string()));
        minimap.name = "minimap".to_string();

        Ok(Self {
            scene,
            cameras: vec![main, minimap],
        })
    }

    /// Orbit the main camera a little each frame
    fn advance(&mut self, frame: u64) {
        let angle = frame as f32 * 0.1;
        if let Some(main) = self.cameras.first_mut() {
            let eye = Vec3::new(angle.sin() * 5.0, 2.0, angle.cos() * 5.0);
            *main = main.clone().looking_at(eye, Vec3::new(0.0, 0.0, -20.0), Vec3::y());
        }
    }
}

fn log_submission(submission: &Submission) {
    let labels = submission.labels();
    log::debug!("  {}: {}", submission.camera, labels.join(" > "));
}

/// Render `frames` frames with `materials`, the library `demo` was built from
fn run_renderer(
    config: &RendererConfig,
    materials: MaterialLibrary,
    demo: &mut DemoScene,
    frames: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut renderer = Renderer::new(config, RecordingBackend::new(), materials)?;
    let kind = config.pipeline.kind;

    for frame in 0..frames {
        demo.advance(frame);
        let report = renderer.render(&demo.cameras, &demo.scene);
        for outcome in &report.cameras {
            log::info!(
                "[{}] frame {} camera '{}': {} ({} renderers, {} lights, {} commands)",
                kind,
                report.frame_index,
                outcome.camera,
                outcome.state,
                outcome.visible_renderers,
                outcome.visible_lights,
                outcome.commands_submitted
            );
            if let Some(error) = &outcome.error {
                log::warn!("[{}]   {}", kind, error);
            }
        }
        let backend = renderer.backend_mut();
        for submission in backend.submissions() {
            log_submission(submission);
        }
        backend.clear_submissions();
    }

    renderer.shutdown();
    let backend = renderer.backend();
    log::info!(
        "[{}] {} target allocations, {} releases, {} live, {} bytes pooled",
        kind,
        backend.total_allocations(),
        backend.total_releases(),
        backend.live_targets(),
        backend.memory_in_use()
    );
    if backend.live_targets() != 0 || backend.live_buffers() != 0 {
        return Err(format!("{} pipeline leaked resources", kind).into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;

    if let Some((path, kind)) = &args.create_asset {
        logging::init_with_level("info");
        PipelineAsset::create_asset(path, *kind)?;
        return Ok(());
    }

    let configs = match &args.config {
        Some(path) => {
            let config = RendererConfig::load_from_file(path)?;
            logging::init_with_level(&config.log_level);
            log::info!("Loaded renderer configuration from {}", path);
            vec![config]
        }
        None => {
            logging::init_with_level("info");
            PipelineKind::ALL
                .iter()
                .map(|kind| RendererConfig::new(PipelineAsset::new(kind.name(), *kind)))
                .collect()
        }
    };

    let materials = MaterialLibrary::with_builtin_materials();
    let mut demo = DemoScene::generate(&materials, args.seed.unwrap_or(DEFAULT_SEED))?;
    log::info!(
        "Generated scene with {} objects and {} lights",
        demo.scene.objects().len(),
        demo.scene.lights().len()
    );

    let frames = args.frames.unwrap_or(DEFAULT_FRAMES);
    for config in &configs {
        run_renderer(config, materials.clone(), &mut demo, frames)?;
    }

    log::info!("Pipeline demo finished");
    Ok(())
}
