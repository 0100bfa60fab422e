//! Frame Pipeline Example
//!
//! Runs a short synthetic capture through the full pipeline: two noisy
//! detectors, calibration, Bayesian fusion, temporal consensus and the
//! delta cache.
//!
//! ## What You'll Learn
//!
//! - Plugging detectors in as closures
//! - Reading `FrameOutcome`s
//! - Watching warm-up, consensus and cache hits happen
//! - Switching power profiles
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_frame_pipeline
//! ```

use chartfuse_core::{
    BoundingBox, Detection, DeviceState, FrameOutcome, FrameView, FusionPipeline, PipelineConfig,
    PowerProfile,
};

const WIDTH: u32 = 128;
const HEIGHT: u32 = 96;

/// Grayscale chart with a zig-zag price line shifted by `offset` pixels
fn chart(offset: u32) -> Vec<u8> {
    let mut pixels = vec![20u8; (WIDTH * HEIGHT) as usize];
    for x in 0..WIDTH {
        let phase = (x + offset) % 40;
        let level = if phase < 20 { phase } else { 40 - phase };
        let y = (10 + level * 3).min(HEIGHT - 1);
        pixels[(y * WIDTH + x) as usize] = 240;
    }
    pixels
}

fn main() -> Result<(), chartfuse_core::ConfigError> {
    println!("ChartFuse Frame Pipeline Example");
    println!("================================\n");

    let mut pipeline = FusionPipeline::new(PipelineConfig::default())?;

    // The learned detector sees the head-and-shoulders every frame, plus a
    // one-off wedge on frame 4.
    let mut frame_index = 0u32;
    let mut ml = |_: &FrameView<'_>| {
        frame_index += 1;
        let mut out = vec![Detection::new(
            "Head and Shoulders",
            0.88,
            BoundingBox::new(30, 20, 100, 70),
        )];
        if frame_index == 4 {
            out.push(Detection::new("Wedge", 0.93, BoundingBox::new(5, 5, 25, 25)));
        }
        out
    };

    // The template matcher agrees on the same region
    let mut template = |_: &FrameView<'_>| {
        vec![Detection::new("Head and Shoulders", 0.81, BoundingBox::new(32, 21, 101, 72))]
    };

    // Frames 1-6 scroll the chart; 7-9 hold it still
    let frames: Vec<Vec<u8>> = (0..9u32).map(|i| chart(i.min(6) * 10)).collect();

    for (i, pixels) in frames.iter().enumerate() {
        let sequence = i as u64 + 1;
        let frame = FrameView::gray(pixels, WIDTH, HEIGHT)
            .with_sequence(sequence)
            .with_timestamp(sequence * 33);

        let outcome = pipeline.process_frame(&frame, &mut ml, &mut template);
        let label = match &outcome {
            FrameOutcome::Processed(_) => "processed",
            FrameOutcome::Cached(_) => "cached",
            FrameOutcome::Stale { .. } => "stale",
        };

        println!("Frame {} ({}):", sequence, label);
        for pattern in outcome.patterns() {
            println!(
                "  {:<20} {:.3}  sources {:?}",
                pattern.class.name(),
                pattern.confidence,
                pattern.sources
            );
        }
    }

    // A replayed frame is rejected
    let replay = FrameView::gray(&frames[0], WIDTH, HEIGHT).with_sequence(3);
    println!("\nReplayed frame: {:?}", pipeline.process_frame(&replay, &mut ml, &mut template));

    let stats = pipeline.stats();
    println!("\nStatistics:");
    println!("  Frames offered:      {}", stats.frames);
    println!("  Detector runs:       {}", stats.processed);
    println!("  Cache hits:          {}", stats.cache_hits);
    println!("  Stale frames:        {}", stats.stale_frames);
    println!("  Rejected detections: {}", stats.rejected_detections);
    println!("  Cache hit rate:      {:.0}%", stats.cache_hit_rate() * 100.0);

    // Battery is low: drop to the ultra-low profile
    let device = DeviceState {
        battery_percent: 12,
        charging: false,
        power_save: false,
        thermal_throttled: false,
    };
    let profile = PowerProfile::select(&device);
    pipeline.set_power_profile(profile);

    println!("\nPower profile {:?}:", profile);
    println!("  Capture interval:  {} ms", profile.frame_interval_ms());
    println!("  Temporal window:   {} frames", pipeline.config().temporal.window_size);
    println!("  Change threshold:  {} bits", pipeline.config().delta.change_threshold_bits);

    Ok(())
}
