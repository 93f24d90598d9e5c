use mesh_rendezvous::prelude::*;
use proptest::prelude::*;

fn arb_box() -> impl Strategy<Value = BoundingBox> {
    (
        prop::array::uniform3(-100.0f64..100.0),
        prop::array::uniform3(0.0f64..50.0),
    )
        .prop_map(|(min, extent)| {
            let max = [min[0] + extent[0], min[1] + extent[1], min[2] + extent[2]];
            BoundingBox::new(min, max)
        })
}

proptest! {
    #[test]
    fn intersection_is_commutative(a in arb_box(), b in arb_box()) {
        let ab = BoundingBox::intersection(&a, &b);
        let ba = BoundingBox::intersection(&b, &a);
        match (ab, ba) {
            (Some(x), Some(y)) => {
                prop_assert_eq!(x.min, y.min);
                prop_assert_eq!(x.max, y.max);
            }
            (None, None) => {}
            _ => prop_assert!(false, "asymmetric intersection"),
        }
    }

    #[test]
    fn intersection_is_contained_in_both(a in arb_box(), b in arb_box()) {
        if let Some(x) = BoundingBox::intersection(&a, &b) {
            prop_assert!(a.contains(x.min) && a.contains(x.max));
            prop_assert!(b.contains(x.min) && b.contains(x.max));
        }
    }

    #[test]
    fn intersects_agrees_with_intersection(a in arb_box(), b in arb_box()) {
        prop_assert_eq!(a.intersects(&b), BoundingBox::intersection(&a, &b).is_some());
    }

    #[test]
    fn box_intersected_with_itself_is_itself(a in arb_box()) {
        let x = BoundingBox::intersection(&a, &a).unwrap();
        prop_assert_eq!(x.min, a.min);
        prop_assert_eq!(x.max, a.max);
    }

    #[test]
    fn union_contains_both_corners(a in arb_box(), b in arb_box()) {
        let u = a.union(&b);
        prop_assert!(u.contains(a.min) && u.contains(a.max));
        prop_assert!(u.contains(b.min) && u.contains(b.max));
    }

    #[test]
    fn from_points_is_tight(pts in prop::collection::vec(prop::array::uniform3(-10.0f64..10.0), 1..32)) {
        let bx = BoundingBox::from_points(pts.iter()).unwrap();
        for p in &pts {
            prop_assert!(bx.contains(*p));
        }
        // Each face of the tight box is touched by at least one point.
        for axis in 0..3 {
            prop_assert!(pts.iter().any(|p| p[axis] == bx.min[axis]));
            prop_assert!(pts.iter().any(|p| p[axis] == bx.max[axis]));
        }
    }
}
