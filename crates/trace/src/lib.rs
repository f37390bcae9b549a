#![allow(dead_code)]

pub mod camera;
pub mod film;
pub mod integrator;
pub mod light;
pub mod renderer;
pub mod sampler;
pub mod scene;

pub use camera::PerspectiveCamera;
pub use film::{BlockGenerator, Film, FilmBlock, GaussianFilter};
pub use integrator::{DirectLightingIntegrator, Integrator, LightStrategy, PathIntegrator, WhittedIntegrator};
pub use light::{Light, LightSample};
pub use renderer::{RenderSettings, Renderer, Scheduler, SequentialScheduler, ThreadScheduler};
pub use sampler::{CameraSample, LatinHypercubeSampler, SampleRequests, Sampler, StratifiedSampler};
pub use scene::Scene;
