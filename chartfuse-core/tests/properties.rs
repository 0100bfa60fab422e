//! Property tests for the numeric invariants of each stage

use proptest::prelude::*;

use chartfuse_core::calibration::series;
use chartfuse_core::confluence::{find_confluence_zones, CalibratedMatch};
use chartfuse_core::delta::DeltaCache;
use chartfuse_core::fusion::FusionEngine;
use chartfuse_core::{
    iou, BoundingBox, Calibrator, Detection, FrameView, PatternClass, TemporalStabilizer,
};

fn any_box() -> impl Strategy<Value = BoundingBox> {
    (-500i32..500, -500i32..500, 0i32..300, 0i32..300)
        .prop_map(|(x, y, w, h)| BoundingBox::from_origin_size(x, y, w, h))
}

fn any_class() -> impl Strategy<Value = PatternClass> {
    (0usize..13).prop_map(|i| match PatternClass::KNOWN.get(i) {
        Some(class) => class.clone(),
        None => PatternClass::from_name("Bump and Run"),
    })
}

fn any_detection() -> impl Strategy<Value = Detection> {
    (any_class(), 0.0f32..=1.0, any_box())
        .prop_map(|(class, confidence, bbox)| Detection::new(class, confidence, bbox))
}

proptest! {
    #[test]
    fn calibration_stays_in_unit_range(
        raw in prop::num::f32::ANY,
        consensus in prop::num::f32::ANY,
        class in any_class(),
    ) {
        let score = Calibrator::default().calibrate(&class, raw, consensus);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn calibration_floor_is_exact(raw in 0.0f32..=1.0, class in any_class()) {
        let mut calibrator = Calibrator::default();
        let floor = calibrator.curve(&class).min_confidence;
        let score = calibrator.calibrate(&class, raw, 0.0);
        prop_assert!(score == 0.0 || score >= floor);
    }

    #[test]
    fn logistic_is_monotonic(a in -40.0f64..40.0, b in -40.0f64..40.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(series::logistic(lo) <= series::logistic(hi));
    }

    #[test]
    fn exp_tracks_std(x in -30.0f64..30.0) {
        let rel = (series::exp(x) - x.exp()).abs() / x.exp();
        prop_assert!(rel < 1e-12);
    }

    #[test]
    fn iou_bounds(a in any_box(), b in any_box()) {
        let overlap = iou(&a, &b);
        prop_assert!((0.0..=1.0).contains(&overlap));
        prop_assert_eq!(overlap, iou(&b, &a));
        if a.area() > 0 {
            prop_assert_eq!(iou(&a, &a), 1.0);
        }
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero(a in any_box(), gap in 1i32..100) {
        let b = a.translate(a.width() as i32 + gap, 0);
        prop_assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn template_support_never_lowers_confidence(
        ml in any_detection(),
        template_confidence in 0.0f32..=1.0,
    ) {
        let engine = FusionEngine::default();
        let alone = engine.fuse(&[ml.clone()], &[]);
        let support = Detection::new(ml.class.clone(), template_confidence, ml.bbox);
        let confirmed = engine.fuse(&[ml.clone()], &[support]);

        let alone = alone.iter().find(|p| p.class == ml.class).map(|p| p.confidence);
        let best = confirmed.iter().map(|p| p.confidence).fold(0.0f32, f32::max);
        prop_assert!(alone.map_or(true, |c| best >= c));
    }

    #[test]
    fn fusion_output_is_sorted_and_bounded(
        ml in prop::collection::vec(any_detection(), 0..8),
        template in prop::collection::vec(any_detection(), 0..8),
    ) {
        let fused = FusionEngine::default().fuse(&ml, &template);
        prop_assert!(fused.len() <= ml.len() + template.len());
        prop_assert!(fused.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        prop_assert!(fused.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
    }

    #[test]
    fn stabilizer_output_is_sorted(frames in prop::collection::vec(
        prop::collection::vec(any_detection(), 0..5), 1..12,
    )) {
        let engine = FusionEngine::default();
        let mut stabilizer = TemporalStabilizer::default();
        for frame in frames {
            let out = stabilizer.stabilize(engine.fuse(&frame, &[]));
            prop_assert!(out.windows(2).all(|w| w[0].confidence >= w[1].confidence));
            prop_assert!(stabilizer.history_len() <= 5);
        }
    }

    #[test]
    fn zones_never_hold_singletons(
        centers in prop::collection::vec((0i32..400, 0i32..400, 0.0f32..=1.0), 0..30),
    ) {
        let matches: Vec<CalibratedMatch> = centers
            .iter()
            .enumerate()
            .map(|(i, &(x, y, confidence))| CalibratedMatch {
                id: i as u64,
                class: PatternClass::Flag,
                confidence,
                bbox: BoundingBox::new(x - 5, y - 5, x + 5, y + 5),
                timestamp_ms: 0,
            })
            .collect();

        for zone in find_confluence_zones(&matches, 50, 2) {
            prop_assert!(zone.pattern_count() >= 2);
            prop_assert!(zone.strength >= 1.0 && zone.strength <= 3.0);
        }
    }

    #[test]
    fn identical_frames_hit_after_commit(pixels in prop::collection::vec(any::<u8>(), 256)) {
        let frame = FrameView::gray(&pixels, 16, 16);
        let mut cache = DeltaCache::default();

        prop_assert!(cache.should_process(&frame));
        cache.update_cache(Vec::new());
        prop_assert!(!cache.should_process(&frame));
    }
}
