//! Surface Cache demo
//!
//! Loads the cache configuration from the environment, installs the
//! process-wide manager, runs a small torus workload twice and prints the
//! resulting statistics as JSON.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use surface_cache::registry::{self, cached_torus};
use surface_cache::{spawn_cleanup_task, CacheConfig, Ttl};

#[derive(Debug, Serialize)]
struct TorusParams {
    major_radius: f64,
    minor_radius: f64,
    resolution: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct TorusMesh {
    vertices: Vec<[f64; 3]>,
    area: f64,
}

fn torus_mesh(params: &TorusParams) -> TorusMesh {
    let n = params.resolution.max(1);
    let step = 2.0 * PI / f64::from(n);
    let mut vertices = Vec::with_capacity((n as usize) * (n as usize));

    for i in 0..n {
        let u = step * f64::from(i);
        for j in 0..n {
            let v = step * f64::from(j);
            let ring = params.major_radius + params.minor_radius * v.cos();
            vertices.push([ring * u.cos(), ring * u.sin(), params.minor_radius * v.sin()]);
        }
    }

    TorusMesh {
        vertices,
        area: 4.0 * PI * PI * params.major_radius * params.minor_radius,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surface_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: backend={:?}, max_size={}, default_ttl={}s, cleanup_interval={}s",
        config.effective_backend(),
        config.max_size,
        config.default_ttl,
        config.cleanup_interval
    );

    let manager = registry::initialize(&config).context("failed to initialize cache")?;

    let cleanup_handle = (config.cleanup_interval > 0).then(|| {
        spawn_cleanup_task(
            manager.clone(),
            Duration::from_secs(config.cleanup_interval),
        )
    });

    let workload = [(3.0, 1.0, 64), (2.0, 0.5, 128), (3.0, 1.0, 64)];
    for round in 1..=2 {
        let started = Instant::now();
        for &(major_radius, minor_radius, resolution) in &workload {
            let params = TorusParams {
                major_radius,
                minor_radius,
                resolution,
            };
            let mesh = cached_torus(Ttl::Default, &params, torus_mesh);
            info!(
                "Torus R={} r={} n={}: {} vertices, area {:.3}",
                major_radius,
                minor_radius,
                resolution,
                mesh.vertices.len(),
                mesh.area
            );
        }
        info!("Round {} finished in {:?}", round, started.elapsed());
    }

    let stats = manager.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }

    Ok(())
}
