use proptest::prelude::*;

use hexsettle::{
    hex::{hex_round, wrap_fold, HexCoord, Layout, Point, Torus},
    noise::NoiseField,
};

proptest! {
    #[test]
    fn pixel_round_trip_recovers_coord(q in -500i32..500, r in -500i32..500, size in 1.0f64..80.0) {
        let layout = Layout::new(size);
        let coord = HexCoord::new(q, r);
        prop_assert_eq!(layout.pixel_to_axial(layout.axial_to_pixel(coord)), coord);
    }

    #[test]
    fn rounding_keeps_cube_invariant(q in -1e4f64..1e4, r in -1e4f64..1e4) {
        let (x, y, z) = hex_round(q, r).to_cube();
        prop_assert_eq!(x + y + z, 0);
    }

    #[test]
    fn hit_test_picks_nearest_center(x in -3_000.0f64..3_000.0, y in -3_000.0f64..3_000.0) {
        let layout = Layout::default();
        let point = Point::new(x, y);
        let hit = layout.pixel_to_axial(point);
        let own = point.distance(layout.axial_to_pixel(hit));
        for neighbor in hit.neighbors() {
            prop_assert!(own <= point.distance(layout.axial_to_pixel(neighbor)) + 1e-6);
        }
    }

    #[test]
    fn fold_lands_in_half_open_window(value in -1e5f64..1e5, period in 1.0f64..5_000.0) {
        let folded = wrap_fold(value, period);
        prop_assert!(folded >= -period / 2.0 && folded < period / 2.0);
        let turns = (value - folded) / period;
        prop_assert!((turns - turns.round()).abs() < 1e-6);
    }

    #[test]
    fn wrapped_hit_test_ignores_whole_periods(
        q in 0i32..20,
        r in 0i32..16,
        dx in -3i32..3,
        dy in -3i32..3,
    ) {
        let layout = Layout::default();
        let torus = Torus::new(layout, 20, 16);
        let coord = HexCoord::new(q - r / 2, r);
        let center = layout.axial_to_pixel(coord);
        let shifted = Point::new(
            center.x + f64::from(dx) * torus.period_x(),
            center.y + f64::from(dy) * torus.period_y(),
        );
        prop_assert_eq!(torus.wrap_coord(layout.pixel_to_axial(shifted)), coord);
    }

    #[test]
    fn noise_stays_in_range(seed in any::<u64>(), x in -1e3f64..1e3, y in -1e3f64..1e3) {
        let field = NoiseField::new(seed);
        let value = field.sample(x, y);
        prop_assert!((-1.0..=1.0).contains(&value));
        prop_assert_eq!(value, NoiseField::new(seed).sample(x, y));
    }
}
