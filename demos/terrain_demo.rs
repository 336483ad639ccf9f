//! Demonstration of the full terrain pipeline
//!
//! Builds a procedural heightfield, then flies a camera toward it and prints
//! how culling, LOD selection, and change-driven rebuilds react each frame.

use geomip_terrain::{
    CameraState, HeightGrid, Mat4, NoiseConfig, Terrain, TerrainConfigBuilder, Vec3,
};

fn main() {
    env_logger::init();

    println!("Terrain LOD Demo\n");

    // 8x8 patches of seeded fractal terrain
    let heights = HeightGrid::from_noise(129, 129, 42, &NoiseConfig::default());
    let config = TerrainConfigBuilder::new()
        .max_screen_error(0.02)
        .unwrap()
        .world_scale(Vec3::new(2.0, 1.5, 2.0))
        .unwrap()
        .build();

    let mut terrain = Terrain::new(heights, config).expect("valid 129x129 heightfield");
    println!(
        "Terrain: {}x{} patches over a 129x129 grid",
        terrain.grid().patches_x(),
        terrain.grid().patches_z()
    );

    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 4000.0);
    let center = Vec3::new(128.0, 0.0, 128.0);

    println!("\nFlying in from far away:");
    println!("{:-<66}", "");
    println!(
        "{:>10} {:>10} {:>10} {:>12} {:>12}",
        "height", "visible", "rebuilt", "triangles", "vertices"
    );

    for altitude in [3000.0, 1200.0, 600.0, 300.0, 150.0, 80.0, 80.0] {
        let eye = Vec3::new(128.0, altitude, 128.0 + altitude * 0.5);
        let view = Mat4::look_at_rh(eye, center, Vec3::Y);
        let mesh = terrain.on_pre_render(&CameraState::from_view_proj(view, proj));
        let vertex_count = mesh.vertices().len();

        let stats = terrain.stats();
        println!(
            "{:>10.0} {:>10} {:>10} {:>12} {:>12}",
            altitude,
            stats.visible_patches,
            stats.rebuilt_patches,
            stats.triangles,
            vertex_count
        );
    }

    println!("{:-<66}", "");
    println!("\nNote the second frame at height 80: nothing changed, so no");
    println!("patch was rebuilt and the mesh was reused as-is.");

    // Glance sideways: most of the grid drops out of the frustum.
    let eye = Vec3::new(128.0, 80.0, 168.0);
    let view = Mat4::look_at_rh(eye, eye + Vec3::new(1.0, -0.2, 0.0), Vec3::Y);
    terrain.on_pre_render(&CameraState::from_view_proj(view, proj));
    println!(
        "\nLooking sideways: {} of {} patches visible, {} triangles",
        terrain.stats().visible_patches,
        terrain.grid().len(),
        terrain.stats().triangles
    );
}
