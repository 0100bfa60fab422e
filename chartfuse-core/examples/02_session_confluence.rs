//! Session Confluence Example
//!
//! Accumulates stable patterns over a scanning session and reports the
//! regions where several of them coincide.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_session_confluence
//! ```

use chartfuse_core::{
    BoundingBox, Detection, FrameView, FusionPipeline, NoDetections, PatternDetector,
};

/// Detector replaying a fixed scene
struct Scene {
    detections: Vec<Detection>,
}

impl PatternDetector for Scene {
    fn detect(&mut self, _frame: &FrameView<'_>) -> Vec<Detection> {
        self.detections.clone()
    }
}

fn main() {
    println!("ChartFuse Session Confluence Example");
    println!("====================================\n");

    let mut pipeline = FusionPipeline::default();
    let mut scene = Scene {
        detections: vec![
            // Support region around (300, 400)
            Detection::new("Double Bottom", 0.91, BoundingBox::new(270, 370, 330, 430)),
            Detection::new("Triangle", 0.86, BoundingBox::new(280, 380, 335, 425)),
            Detection::new("Cup and Handle", 0.83, BoundingBox::new(275, 372, 320, 418)),
            // Lone continuation pattern elsewhere
            Detection::new("Flag", 0.9, BoundingBox::new(600, 100, 660, 150)),
            // Two flags printed side by side
            Detection::new("Flag", 0.78, BoundingBox::new(100, 600, 150, 640)),
            Detection::new("Flag", 0.8, BoundingBox::new(112, 605, 160, 645)),
        ],
    };

    // Frames without pixel data are always processed
    let mut now_ms = 0;
    for sequence in 1..=8 {
        now_ms = sequence * 33;
        let frame = FrameView::gray(&[], 0, 0)
            .with_sequence(sequence)
            .with_timestamp(now_ms);
        pipeline.process_frame(&frame, &mut scene, &mut NoDetections);
    }

    println!("Session ledger: {} matches", pipeline.ledger().len());
    for m in pipeline.ledger().matches() {
        println!("  #{:<3} {:<16} {:.2} at {:?}", m.id, m.class.name(), m.confidence, m.center());
    }

    let zones = pipeline.recent_confluence_zones(now_ms);
    println!("\nConfluence zones: {}", zones.len());
    for zone in &zones {
        println!(
            "  {:<32} strength {:.2}{}  centroid ({:.0}, {:.0})",
            zone.description(),
            zone.strength,
            if zone.is_high_strength() { " (high)" } else { "" },
            zone.centroid.x,
            zone.centroid.y
        );
    }
}
