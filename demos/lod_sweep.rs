//! Per-patch look at LOD selection
//!
//! Pulls the camera back step by step over a single column of patches and
//! prints which level each patch settles on, together with its projected
//! screen-space error.

use geomip_terrain::{
    CameraState, HeightGrid, Mat4, NoiseConfig, Terrain, TerrainConfigBuilder, Vec3,
};

fn main() {
    env_logger::init();

    println!("LOD Selection Sweep\n");

    let heights = HeightGrid::from_noise(33, 161, 7, &NoiseConfig::default());
    let config = TerrainConfigBuilder::new()
        .max_screen_error(0.015)
        .unwrap()
        .build();
    let mut terrain = Terrain::new(heights, config).expect("valid 33x161 heightfield");

    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 2000.0);

    // Stand near the z=0 end of the strip and look down its length, so the
    // patch rows recede from the camera one after another.
    let eye = Vec3::new(16.0, 30.0, -20.0);
    let view = Mat4::look_at_rh(eye, Vec3::new(16.0, 0.0, 80.0), Vec3::Y);
    terrain.on_pre_render(&CameraState::from_view_proj(view, proj));

    println!(
        "{} patch rows receding from the camera:",
        terrain.grid().patches_z()
    );
    println!("{:-<54}", "");
    println!("{:>8} {:>14} {:>10} {:>14}", "row", "distance", "level", "screen error");

    for row in 0..terrain.grid().patches_z() {
        let patch = terrain.grid().patch(1, row);
        let center = patch.bounds().center();
        let distance = (Vec3::new(center.x, center.y, center.z) - eye).length();

        match patch.current_lod() {
            Some(level) => println!(
                "{:>8} {:>14.1} {:>10} {:>14.4}",
                row,
                distance,
                level,
                patch.screen_error()
            ),
            None => println!("{:>8} {:>14.1} {:>10} {:>14}", row, distance, "culled", "-"),
        }
    }

    println!("{:-<54}", "");
    println!("\nCoarser levels win as the projected error shrinks with distance.");
    println!(
        "Frame total: {} triangles across {} visible patches.",
        terrain.stats().triangles,
        terrain.stats().visible_patches
    );
}
