use std::f64::consts::TAU;

use packgen::packing::container::max_slot_z;
use packgen::{number_ratio, resolve, two_species_number_fraction, volume_prism, volume_prisms};
use packgen::{place_particles, size_container, size_piston, species_counts};
use packgen::{Budget, CumulativeThresholds, Grid, MixtureResolver, PackError, Placement};
use packgen::{RandomSelfAvoiding, SpeciesSpec, TypeSampler};

/// Hexagonal prism species with default contact properties
pub fn species(radius: f64, height: f64, density: f64) -> SpeciesSpec {
    SpeciesSpec {
        sides: 6,
        radius,
        height,
        density,
        friction: 0.5,
        restitution: 0.5,
        linear_damping: 0.04,
    }
}

/// Relative closeness, like Python's math.isclose
pub fn close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

// ==================================================================================
// Geometry tests
// ==================================================================================

#[test]
fn volume_matches_hexagon_formula() {
    let (r, h) = (2.3, 4.5);
    let expected = 3.0 * 3f64.sqrt() / 2.0 * r * r * h;
    let actual = volume_prism(6, r, h).unwrap();

    assert!(close(actual, expected, 1e-12), "expected {expected}, got {actual}");
}

#[test]
fn volume_of_square_prism() {
    // circumradius 1 -> side sqrt(2) -> area 2
    let v = volume_prism(4, 1.0, 3.0).unwrap();
    assert!(close(v, 6.0, 1e-12), "got {v}");
}

#[test]
fn volume_rejects_bad_geometry() {
    assert!(matches!(volume_prism(2, 1.0, 1.0), Err(PackError::InvalidGeometry(_))));
    assert!(matches!(volume_prism(6, 0.0, 1.0), Err(PackError::InvalidGeometry(_))));
    assert!(matches!(volume_prism(6, 1.0, -1.0), Err(PackError::InvalidGeometry(_))));
    assert!(matches!(volume_prism(6, f64::NAN, 1.0), Err(PackError::InvalidGeometry(_))));
}

#[test]
fn volumes_broadcast_scalars() {
    let v = volume_prisms(&[6], &[1.0, 2.0, 3.0], &[1.0]).unwrap();
    assert_eq!(v.len(), 3);
    assert!(close(v[1], 4.0 * v[0], 1e-12));
    assert!(close(v[2], 9.0 * v[0], 1e-12));

    let by_sides = volume_prisms(&[3, 4, 6], &[1.0], &[2.0]).unwrap();
    assert_eq!(by_sides.len(), 3);
    assert!(close(by_sides[1], volume_prism(4, 1.0, 2.0).unwrap(), 1e-12));
}

#[test]
fn volumes_reject_mismatched_lengths() {
    let err = volume_prisms(&[6, 6, 6], &[1.0, 2.0], &[1.0]);
    assert!(matches!(err, Err(PackError::InvalidGeometry(_))));

    let empty = volume_prisms(&[], &[1.0], &[1.0]);
    assert!(matches!(empty, Err(PackError::InvalidGeometry(_))));
}

// ==================================================================================
// Mixture tests
// ==================================================================================

#[test]
fn number_ratio_same_density_and_geometry() {
    let all = vec![species(0.06, 0.05, 1.0); 4];
    let mass = [1.0, 2.0, 3.0, 4.0];
    let total: f64 = mass.iter().sum();

    let fractions = number_ratio(&mass, &all).unwrap();
    for (n, w) in fractions.iter().zip(mass.iter()) {
        assert!(close(*n, w / total, 1e-4), "{n} vs {}", w / total);
    }
}

#[test]
fn number_ratio_half_density_same_geometry() {
    let pair = [species(0.06, 0.05, 0.8), species(0.06, 0.05, 1.6)];
    let fractions = number_ratio(&[1.0, 1.0], &pair).unwrap();
    assert!(close(fractions[0], 2.0 * fractions[1], 1e-4));

    let mixture = resolve(&[1.0, 1.0], &pair, Budget::Particles(3000)).unwrap();
    assert_eq!(mixture.populations, vec![2000, 1000]);
    assert!(mixture.rounding.is_none());
}

#[test]
fn number_ratio_same_density_half_height() {
    let pair = [species(0.06, 0.05, 1.6), species(0.06, 0.10, 1.6)];
    let fractions = number_ratio(&[1.0, 1.0], &pair).unwrap();
    assert!(close(fractions[0], 2.0 * fractions[1], 1e-4));

    let mixture = resolve(&[1.0, 1.0], &pair, Budget::Particles(3000)).unwrap();
    assert_eq!(mixture.populations[0], 2 * mixture.populations[1]);
}

#[test]
fn number_fractions_sum_to_one() {
    let all = [
        species(0.06, 0.05, 1.3),
        species(0.04, 0.11, 2.7),
        species(0.09, 0.02, 0.6),
    ];
    let mixture = resolve(&[0.2, 0.5, 0.3], &all, Budget::Particles(977)).unwrap();

    let sum: f64 = mixture.number_fractions.iter().sum();
    let exact_sum: f64 = mixture.exact_fractions.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
    assert!((exact_sum - 1.0).abs() < 1e-6, "exact sum = {exact_sum}");
    assert_eq!(mixture.total(), 977);
}

#[test]
fn two_species_closed_form_agrees_with_general_solution() {
    let a = species(0.06, 0.05, 1.0);
    let b = species(0.05, 0.08, 0.8);

    for x in [0.0, 0.1, 0.3, 0.5, 0.9, 1.0] {
        let general = number_ratio(&[1.0 - x, x], &[a.clone(), b.clone()]).unwrap();
        let closed = two_species_number_fraction(x, &b, &a).unwrap();
        assert!((general[1] - closed).abs() < 1e-12, "x = {x}: {} vs {closed}", general[1]);
    }
}

#[test]
fn zero_mass_fraction_gives_zero_population() {
    let pair = [species(0.06, 0.05, 1.0), species(0.06, 0.05, 1.0)];

    let only_b = resolve(&[0.0, 1.0], &pair, Budget::Particles(12)).unwrap();
    assert_eq!(only_b.populations, vec![0, 12]);

    let only_a = resolve(&[1.0, 0.0], &pair, Budget::Particles(12)).unwrap();
    assert_eq!(only_a.populations, vec![12, 0]);

    let v = pair[0].volume().unwrap();
    let by_volume = resolve(&[0.0, 1.0], &pair, Budget::Volume(10.0 * v)).unwrap();
    assert_eq!(by_volume.populations[0], 0);
}

#[test]
fn single_species_takes_everything() {
    let one = [species(0.06, 0.05, 1.0)];
    let mixture = resolve(&[0.4], &one, Budget::Particles(7)).unwrap();

    assert_eq!(mixture.number_fractions, vec![1.0]);
    assert_eq!(mixture.populations, vec![7]);
    assert!(mixture.rounding.is_none());
}

#[test]
fn tiny_fraction_still_gets_one_particle() {
    let pair = [species(0.06, 0.05, 1.0), species(0.06, 0.05, 1.0)];
    let mixture = resolve(&[0.999, 0.001], &pair, Budget::Particles(10)).unwrap();

    assert_eq!(mixture.populations, vec![9, 1]);
    assert!(mixture.rounding.is_some(), "one particle in ten is far from 0.1%");
}

#[test]
fn remainder_species_never_left_empty() {
    let three = vec![species(0.06, 0.05, 1.0); 3];
    let mixture = resolve(&[0.001, 0.5, 0.499], &three, Budget::Particles(3)).unwrap();

    assert_eq!(mixture.total(), 3);
    assert!(mixture.populations.iter().all(|&p| p >= 1), "{:?}", mixture.populations);
}

#[test]
fn budget_smaller_than_species_is_rejected() {
    let three = vec![species(0.06, 0.05, 1.0); 3];
    let err = resolve(&[1.0, 1.0, 1.0], &three, Budget::Particles(2));
    assert!(matches!(err, Err(PackError::InvalidMixtureInput(_))));
}

#[test]
fn invalid_mixture_inputs_are_rejected() {
    let pair = [species(0.06, 0.05, 1.0), species(0.06, 0.05, 1.0)];
    let invalid = |r: packgen::Result<packgen::ResolvedMixture>| {
        matches!(r, Err(PackError::InvalidMixtureInput(_)))
    };

    assert!(invalid(resolve(&[1.0], &pair, Budget::Particles(10))));
    assert!(invalid(resolve(&[0.0, 0.0], &pair, Budget::Particles(10))));
    assert!(invalid(resolve(&[-0.5, 1.5], &pair, Budget::Particles(10))));
    assert!(invalid(resolve(&[0.5, 0.5], &pair, Budget::Particles(0))));
    assert!(invalid(resolve(&[0.5, 0.5], &pair, Budget::Volume(-1.0))));
    assert!(invalid(resolve(&[0.5, 0.5], &[], Budget::Particles(10))));
}

#[test]
fn invalid_species_geometry_is_rejected() {
    let pair = [species(0.06, 0.05, 1.0), species(-0.06, 0.05, 1.0)];
    let err = resolve(&[0.5, 0.5], &pair, Budget::Particles(10));
    assert!(matches!(err, Err(PackError::InvalidGeometry(_))));
}

#[test]
fn large_volume_budget_never_rounds_down() {
    let one = [species(1.0, 1.0, 1.0)];
    let v = one[0].volume().unwrap();
    let requested = (2e9 + 0.5) * v;

    let mixture = resolve(&[1.0], &one, Budget::Volume(requested)).unwrap();
    assert!(mixture.populations[0] as f64 * v >= requested);
    assert_eq!(mixture.populations, vec![2_000_000_001]);
    assert!(mixture.rounding.is_none());
}

#[test]
fn volume_budget_rounds_up() {
    let one = [species(0.06, 0.05, 1.0)];
    let v = one[0].volume().unwrap();

    let mixture = resolve(&[1.0], &one, Budget::Volume(2.5 * v)).unwrap();
    assert_eq!(mixture.populations, vec![3]);

    let report = mixture.rounding.clone().expect("half a particle over 2.5 is 20% off");
    assert!(close(report.relative_error, 0.2, 1e-9));
    assert!(matches!(
        mixture.strict(),
        Err(PackError::RoundingToleranceExceeded(_))
    ));
}

#[test]
fn volume_budget_exact_fit() {
    let pair = [species(0.06, 0.05, 1.0), species(0.06, 0.05, 1.0)];
    let v = pair[0].volume().unwrap();

    let mixture = resolve(&[0.5, 0.5], &pair, Budget::Volume(200.0 * v)).unwrap();
    assert_eq!(mixture.populations, vec![100, 100]);
    assert!(mixture.strict().is_ok());
}

#[test]
fn mass_budget_counts_particles_by_mass() {
    let pair = [species(0.06, 0.05, 2.0), species(0.06, 0.05, 2.0)];
    let m = pair[0].particle_mass().unwrap();

    let mixture = resolve(&[1.0, 3.0], &pair, Budget::Mass(40.0 * m)).unwrap();
    assert_eq!(mixture.populations, vec![10, 30]);
}

#[test]
fn coarse_particle_budget_reports_rounding() {
    let pair = [species(0.06, 0.05, 1.0), species(0.06, 0.05, 1.0)];

    let mixture = resolve(&[0.5, 0.5], &pair, Budget::Particles(3)).unwrap();
    assert_eq!(mixture.populations, vec![1, 2]);
    assert!(mixture.rounding.is_some());

    // a loose tolerance accepts the same split
    let loose = MixtureResolver::with_tolerance(0.5)
        .resolve(&[0.5, 0.5], &pair, Budget::Particles(3))
        .unwrap();
    assert!(loose.rounding.is_none());
}

// ==================================================================================
// Sampler tests
// ==================================================================================

#[test]
fn sampler_is_deterministic() {
    let mut s1 = TypeSampler::from_fractions(1234, &[0.3, 0.7]);
    let mut s2 = TypeSampler::from_fractions(1234, &[0.3, 0.7]);

    for _ in 0..1000 {
        assert_eq!(s1.next_species(), s2.next_species());
        assert_eq!(s1.next_rotation(), s2.next_rotation());
    }
}

#[test]
fn different_seeds_give_different_streams() {
    let mut s1 = TypeSampler::from_fractions(1, &[0.5, 0.5]);
    let mut s2 = TypeSampler::from_fractions(2, &[0.5, 0.5]);

    let a: Vec<usize> = (0..64).map(|_| s1.next_species()).collect();
    let b: Vec<usize> = (0..64).map(|_| s2.next_species()).collect();
    assert_ne!(a, b);
}

#[test]
fn sampler_frequency_converges() {
    let n = 100_000;
    let mut sampler = TypeSampler::new(7, CumulativeThresholds::from_fractions(&[0.2, 0.8]));
    assert_eq!(sampler.thresholds().bounds(), &[0.2, 1.0]);

    let zeros = (0..n).filter(|_| sampler.next_species() == 0).count();
    let freq = zeros as f64 / n as f64;
    let tol = 5.0 / (n as f64).sqrt();
    assert!((freq - 0.2).abs() < tol, "frequency {freq} outside 0.2 +/- {tol}");
}

#[test]
fn boundary_value_goes_to_lower_species() {
    let t = CumulativeThresholds::from_fractions(&[0.2, 0.8]);

    assert_eq!(t.species_for(0.0), 0);
    assert_eq!(t.species_for(0.2), 0);
    assert_eq!(t.species_for(0.2000001), 1);
    assert_eq!(t.species_for(0.999999), 1);
}

#[test]
fn empty_buckets_are_never_selected() {
    let leading_empty = CumulativeThresholds::from_fractions(&[0.0, 1.0]);
    assert_eq!(leading_empty.species_for(0.0), 1);

    let middle_empty = CumulativeThresholds::from_fractions(&[0.5, 0.0, 0.5]);
    assert_eq!(middle_empty.species_for(0.5), 0);
    assert_eq!(middle_empty.species_for(0.75), 2);

    // round-off leaves the last two bounds equal just below 1.0
    let trailing_empty = CumulativeThresholds::from_fractions(&[0.04333, 0.09667, 0.0]);
    assert_eq!(trailing_empty.species_for(1.0 - f64::EPSILON / 2.0), 1);
    assert_eq!(trailing_empty.species_for(1.0), 1);
}

#[test]
fn rotations_lie_in_full_turn() {
    let mut sampler = TypeSampler::from_fractions(99, &[1.0]);
    for _ in 0..1000 {
        let r = sampler.next_rotation();
        for angle in r.iter() {
            assert!((0.0..TAU).contains(angle), "angle {angle} out of range");
        }
    }
}

// ==================================================================================
// Placement tests
// ==================================================================================

#[test]
fn grid_positions_are_unique_and_layered() {
    let grid = Grid::new(2, 2, 3, 1.0);
    let mut sampler = TypeSampler::from_fractions(0, &[1.0]);
    let positions = grid.place(&mut sampler);

    assert_eq!(positions.len(), 12);
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            assert!((a - b).norm() > 1e-9, "duplicate position {a:?}");
        }
        assert!([0.5, 1.5, 2.5].contains(&a.z), "unexpected z {}", a.z);
        assert!([-0.5, 0.5].contains(&a.x));
        assert!([-0.5, 0.5].contains(&a.y));
    }
}

#[test]
fn grid_z_offset_moves_every_layer() {
    let grid = Grid::new(1, 1, 3, 0.4).with_z0(1.0);
    let mut sampler = TypeSampler::from_fractions(0, &[1.0]);
    let z: Vec<f64> = grid.place(&mut sampler).iter().map(|p| p.z).collect();

    assert_eq!(z.len(), 3);
    assert_eq!(z[0], 1.0);
    assert!(close(z[1], 1.4, 1e-12));
    assert!(close(z[2], 1.8, 1e-12));
}

#[test]
fn grid_runs_z_fastest() {
    let grid = Grid::new(2, 2, 3, 1.0);
    assert_eq!(grid.indices(0), (0, 0, 0));
    assert_eq!(grid.indices(1), (0, 0, 1));
    assert_eq!(grid.indices(3), (0, 1, 0));
    assert_eq!(grid.indices(6), (1, 0, 0));
}

#[test]
fn grid_placement_draws_species_then_rotation() {
    let grid = Grid::new(3, 3, 3, 0.5);
    let mut placer = TypeSampler::from_fractions(2024, &[0.4, 0.6]);
    let slots = place_particles(&grid, &mut placer);

    let mut manual = TypeSampler::from_fractions(2024, &[0.4, 0.6]);
    for slot in &slots {
        assert_eq!(slot.species_index, manual.next_species());
        assert_eq!(slot.rotation, manual.next_rotation());
    }
    assert_eq!(species_counts(&slots, 2).iter().sum::<u64>(), 27);
}

#[test]
fn random_placement_stays_inside_cross_section() {
    let placement = RandomSelfAvoiding::new(200, 2.0, 0.1, 0.2).unwrap();
    assert!(close(placement.half_width, 0.7, 1e-12));

    let mut sampler = TypeSampler::from_fractions(5, &[0.5, 0.5]);
    let slots = place_particles(&placement, &mut sampler);
    assert_eq!(slots.len(), 200);

    let hw = placement.half_width;
    for (k, slot) in slots.iter().enumerate() {
        assert!(slot.position.x.abs() <= hw && slot.position.y.abs() <= hw);
        assert!(close(slot.position.z, 0.1 * (k + 1) as f64, 1e-12));
    }
}

#[test]
fn random_placement_draws_position_species_rotation() {
    let placement = RandomSelfAvoiding::new(10, 2.0, 0.1, 0.2).unwrap();
    let mut placer = TypeSampler::from_fractions(77, &[0.5, 0.5]);
    let slots = place_particles(&placement, &mut placer);

    let hw = placement.half_width;
    let mut manual = TypeSampler::from_fractions(77, &[0.5, 0.5]);
    for slot in &slots {
        let x = hw * (2.0 * manual.next_unit() - 1.0);
        let y = hw * (2.0 * manual.next_unit() - 1.0);
        assert_eq!(slot.position.x, x);
        assert_eq!(slot.position.y, y);
        assert_eq!(slot.species_index, manual.next_species());
        assert_eq!(slot.rotation, manual.next_rotation());
    }
}

#[test]
fn random_placement_rejects_narrow_container() {
    let err = RandomSelfAvoiding::new(10, 0.5, 0.1, 0.2);
    assert!(matches!(err, Err(PackError::InvalidGeometry(_))));
}

// ==================================================================================
// Container tests
// ==================================================================================

#[test]
fn container_clears_the_stack() {
    let grid = Grid::new(2, 2, 3, 1.0);
    let mut sampler = TypeSampler::from_fractions(3, &[1.0]);
    let slots = place_particles(&grid, &mut sampler);
    let all = [species(0.3, 0.2, 1.0)];

    let container = size_container(&slots, &all, 2.0, 0.2, 1.2).unwrap();
    let expected = 1.2 * (2.5 + 0.1f64.sqrt());

    assert_eq!(max_slot_z(&slots), 2.5);
    assert!(close(container.side_length, 2.0, 1e-12));
    assert!(close(container.height, expected, 1e-12));
    assert_eq!(container.wall_thickness, 0.2);

    assert!(size_container(&slots, &all, 2.0, 0.2, 1.0).is_err());
    assert!(size_container(&slots, &all, 0.0, 0.2, 1.2).is_err());
}

#[test]
fn piston_starts_above_particles_without_friction() {
    let grid = Grid::new(2, 2, 3, 1.0);
    let mut sampler = TypeSampler::from_fractions(3, &[1.0]);
    let slots = place_particles(&grid, &mut sampler);
    let container = size_container(&slots, &[species(0.3, 0.2, 1.0)], 2.0, 0.2, 1.2).unwrap();

    let piston = size_piston(&container, &slots, 0.1, 4.0, 0.5).unwrap();
    assert!(close(piston.side_length, 1.8, 1e-12));
    assert!(close(piston.z_offset, 2.5 + 0.5 + 0.1, 1e-12));
    assert_eq!(piston.thickness, 0.2);
    assert_eq!(piston.mass, 4.0);
    assert_eq!(piston.friction, 0.0);
    assert_eq!(piston.restitution, 0.0);

    assert!(size_piston(&container, &slots, 1.0, 4.0, 0.5).is_err());
    assert!(size_piston(&container, &slots, 0.1, 0.0, 0.5).is_err());
}
