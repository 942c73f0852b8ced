// Growth engine: germination, hyphal extension, root connection, branching

use glam::{Quat, Vec3};
use rand::Rng;

use crate::config::SimulationParameters;
use crate::hypha::Hypha;
use crate::root::Root;
use crate::spore::Spore;
use crate::types::IdSource;

/// Hard floor below which germination stops entirely.
const GERMINATION_MOISTURE_FLOOR: f32 = 0.2;
/// Minimum viability a spore needs to ever germinate.
const GERMINATION_VIABILITY_FLOOR: f32 = 0.3;
/// Radius within which roots pull growing tips toward them.
const ATTRACTION_RADIUS: f32 = 4.0;
/// Tips closer than this to the previous segment overwrite it instead of
/// appending, keeping the polyline from accumulating micro-segments.
const SEGMENT_SPACING: f32 = 0.08;

/// Advance germination, extension, connection and branching by `dt` seconds.
///
/// A no-op when `dt <= 0`: no spore germinates, no segment is added, no
/// branch is created.
pub fn advance_growth<R: Rng>(
    spores: &mut [Spore],
    hyphae: &mut Vec<Hypha>,
    roots: &mut [Root],
    params: &SimulationParameters,
    dt: f32,
    ids: &mut IdSource,
    rng: &mut R,
) {
    if dt <= 0.0 {
        return;
    }

    germinate(spores, hyphae, roots, params, ids, rng);

    let mut branches = Vec::new();
    for hypha in hyphae.iter_mut() {
        if !hypha.active {
            continue;
        }

        extend(hypha, roots, params, dt, rng);

        if hypha.path_length() > params.max_hyphal_length * (1.0 + params.nutrients * 0.3) {
            hypha.active = false;
            continue;
        }

        connect(hypha, roots, params);

        if let Some(branch) = try_branch(hypha, params, ids, rng) {
            branches.push(branch);
        }
    }
    hyphae.extend(branches);
}

fn germinate<R: Rng>(
    spores: &mut [Spore],
    hyphae: &mut Vec<Hypha>,
    roots: &[Root],
    params: &SimulationParameters,
    ids: &mut IdSource,
    rng: &mut R,
) {
    if params.soil_moisture <= GERMINATION_MOISTURE_FLOOR {
        return;
    }

    let moisture_factor =
        ((params.soil_moisture - GERMINATION_MOISTURE_FLOOR) / 0.8).max(0.0);
    let nutrient_factor = ((params.nutrients - 0.2) / 0.8).max(0.0);
    let chance =
        (0.008 + params.colonization_rate * 0.01) * moisture_factor * nutrient_factor;

    for spore in spores.iter_mut() {
        if spore.germinated || spore.viability <= GERMINATION_VIABILITY_FLOOR {
            continue;
        }
        if rng.gen::<f32>() >= chance {
            continue;
        }
        spore.germinated = true;
        let direction = sprout_direction(spore.position, roots, rng);
        hyphae.push(Hypha::sprout(
            ids.mint(),
            spore.position,
            direction,
            Some(spore.id),
        ));
    }
}

/// Initial growth direction: toward the nearest root with a random wobble,
/// or a downward-biased random direction when no roots exist.
fn sprout_direction<R: Rng>(origin: Vec3, roots: &[Root], rng: &mut R) -> Vec3 {
    let nearest = roots.iter().min_by(|a, b| {
        a.position
            .distance(origin)
            .total_cmp(&b.position.distance(origin))
    });
    let raw = match nearest {
        Some(root) => {
            let toward = (root.position - origin).normalize_or_zero();
            toward
                + Vec3::new(
                    (rng.gen::<f32>() - 0.5) * 0.3,
                    (rng.gen::<f32>() - 0.5) * 0.3,
                    (rng.gen::<f32>() - 0.5) * 0.3,
                )
        }
        None => Vec3::new(
            rng.gen::<f32>() - 0.5,
            -rng.gen::<f32>() * 0.5,
            rng.gen::<f32>() - 0.5,
        ),
    };
    let dir = raw.normalize_or_zero();
    if dir == Vec3::ZERO {
        Vec3::NEG_Y
    } else {
        dir
    }
}

fn extend<R: Rng>(
    hypha: &mut Hypha,
    roots: &[Root],
    params: &SimulationParameters,
    dt: f32,
    rng: &mut R,
) {
    let speed = params.growth_rate
        * dt
        * 0.8
        * params.soil_moisture.max(0.4)
        * params.nutrients.max(0.4)
        * (1.0 + 0.3 * hypha.maturity);

    let tip = hypha.tip();

    // Connected hyphae keep their heading; unconnected ones steer toward
    // nearby roots, weighted by proximity and root health.
    if !hypha.connected_to_root {
        let mut attraction = Vec3::ZERO;
        for root in roots {
            let dist = tip.distance(root.position);
            if dist < ATTRACTION_RADIUS {
                let strength = (1.0 / (dist + 0.1)).powf(1.5) * root.health;
                attraction += (root.position - tip).normalize_or_zero() * strength;
            }
        }
        if attraction != Vec3::ZERO {
            hypha.growth_direction = hypha
                .growth_direction
                .lerp(attraction.normalize_or_zero(), 0.2)
                .normalize_or_zero();
        }
    }

    hypha.growth_direction = (hypha.growth_direction
        + Vec3::new(
            (rng.gen::<f32>() - 0.5) * 0.03,
            (rng.gen::<f32>() - 0.5) * 0.02,
            (rng.gen::<f32>() - 0.5) * 0.03,
        ))
    .normalize_or_zero();

    let mut next = tip + hypha.growth_direction * speed;

    // Dry soil pulls tips downward; nutrient-rich soil adds exploratory wander.
    if params.soil_moisture < 0.3 {
        next.y -= (0.3 - params.soil_moisture) * 0.02;
    }
    if params.nutrients > 0.8 {
        next += Vec3::new(
            (rng.gen::<f32>() - 0.5) * 0.01,
            rng.gen::<f32>() * 0.005,
            (rng.gen::<f32>() - 0.5) * 0.01,
        );
    }

    if hypha.segments.len() < 3 || tip.distance(next) > SEGMENT_SPACING {
        hypha.segments.push(next);
    } else {
        let last = hypha.segments.len() - 1;
        hypha.segments[last] = next;
    }

    hypha.maturity = (hypha.maturity + dt * 0.03).min(1.0);
}

fn connect(hypha: &mut Hypha, roots: &mut [Root], params: &SimulationParameters) {
    if hypha.connected_to_root {
        return;
    }
    let range = params.connection_distance * 1.5;
    let tip = hypha.tip();
    for root in roots.iter_mut() {
        if tip.distance(root.position) < range {
            hypha.connected_to_root = true;
            hypha.connected_roots.push(root.id);
            root.colonized = true;
            log::debug!("hypha {} colonized root {}", hypha.id, root.id);
        }
    }
}

fn try_branch<R: Rng>(
    hypha: &mut Hypha,
    params: &SimulationParameters,
    ids: &mut IdSource,
    rng: &mut R,
) -> Option<Hypha> {
    let count = hypha.segments.len();
    if count <= 12 || count % 15 != 0 || hypha.maturity <= 0.6 {
        return None;
    }
    let probability = params.branching_factor
        * params.colonization_rate
        * 0.001
        * (1.0 + 0.3 * hypha.maturity + 0.2 * params.nutrients);
    if rng.gen::<f32>() >= probability {
        return None;
    }

    let tip = hypha.tip();
    hypha.branch_points.push(tip);
    let swing = Quat::from_rotation_y((rng.gen::<f32>() - 0.5) * std::f32::consts::PI * 0.6);
    let direction = (swing * hypha.growth_direction).normalize_or_zero();
    let mut child = Hypha::sprout(ids.mint(), tip, direction, hypha.parent_spore);
    child.maturity = hypha.maturity * 0.7;
    log::debug!("hypha {} branched into {}", hypha.id, child.id);
    Some(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spore_at(id: u64, position: Vec3, viability: f32) -> Spore {
        Spore {
            id,
            position,
            viability,
            germinated: false,
            time_created: 0.0,
        }
    }

    #[test]
    fn no_germination_below_moisture_floor() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ids = IdSource::default();
        let mut params = SimulationParameters::default();
        params.soil_moisture = 0.15;
        let mut spores = vec![spore_at(0, Vec3::new(0.0, -1.0, 0.0), 1.0)];
        let mut hyphae = Vec::new();
        let mut roots = root::initial_layout(&mut ids);

        for _ in 0..10_000 {
            advance_growth(
                &mut spores,
                &mut hyphae,
                &mut roots,
                &params,
                0.1,
                &mut ids,
                &mut rng,
            );
        }
        assert!(hyphae.is_empty());
        assert!(!spores[0].germinated);
    }

    #[test]
    fn low_viability_spores_never_germinate() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut ids = IdSource::default();
        let params = SimulationParameters::default();
        let mut spores = vec![spore_at(0, Vec3::ZERO, 0.3)];
        let mut hyphae = Vec::new();
        let mut roots = root::initial_layout(&mut ids);

        for _ in 0..10_000 {
            advance_growth(
                &mut spores,
                &mut hyphae,
                &mut roots,
                &params,
                0.1,
                &mut ids,
                &mut rng,
            );
        }
        assert!(hyphae.is_empty());
    }

    #[test]
    fn tip_at_root_connects_and_colonizes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut ids = IdSource::default();
        let params = SimulationParameters::default();
        let mut roots = root::initial_layout(&mut ids);
        let mut hyphae = vec![Hypha::sprout(
            ids.mint(),
            roots[0].position,
            Vec3::X,
            None,
        )];
        let mut spores = Vec::new();

        advance_growth(
            &mut spores,
            &mut hyphae,
            &mut roots,
            &params,
            0.01,
            &mut ids,
            &mut rng,
        );

        assert!(hyphae[0].connected_to_root);
        assert_eq!(hyphae[0].connected_roots, vec![roots[0].id]);
        assert!(roots[0].colonized);
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut ids = IdSource::default();
        let params = SimulationParameters::default();
        let mut roots = root::initial_layout(&mut ids);
        let mut hyphae = vec![Hypha::sprout(ids.mint(), Vec3::ZERO, Vec3::X, None)];
        let mut spores = vec![spore_at(ids.mint(), Vec3::ZERO, 1.0)];
        let segments_before = hyphae[0].segments.clone();

        advance_growth(
            &mut spores,
            &mut hyphae,
            &mut roots,
            &params,
            0.0,
            &mut ids,
            &mut rng,
        );

        assert_eq!(hyphae.len(), 1);
        assert_eq!(hyphae[0].segments, segments_before);
        assert!(!spores[0].germinated);
    }

    #[test]
    fn growth_extends_path_and_matures() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ids = IdSource::default();
        let params = SimulationParameters::default();
        let mut roots = Vec::new();
        let mut hyphae = vec![Hypha::sprout(ids.mint(), Vec3::ZERO, Vec3::X, None)];
        let mut spores = Vec::new();

        let mut last_length = 0.0;
        let mut last_maturity = 0.0;
        for _ in 0..50 {
            advance_growth(
                &mut spores,
                &mut hyphae,
                &mut roots,
                &params,
                0.1,
                &mut ids,
                &mut rng,
            );
            let h = &hyphae[0];
            assert!(h.path_length() >= last_length);
            assert!(h.maturity >= last_maturity);
            last_length = h.path_length();
            last_maturity = h.maturity;
        }
        assert!(last_length > 0.0);
        assert!(last_maturity > 0.0);
    }

    #[test]
    fn overlong_hyphae_go_dormant() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut ids = IdSource::default();
        let mut params = SimulationParameters::default();
        params.max_hyphal_length = 0.5;
        let mut roots = Vec::new();
        let mut hyphae = vec![Hypha::sprout(ids.mint(), Vec3::ZERO, Vec3::X, None)];
        let mut spores = Vec::new();

        for _ in 0..500 {
            advance_growth(
                &mut spores,
                &mut hyphae,
                &mut roots,
                &params,
                0.1,
                &mut ids,
                &mut rng,
            );
        }
        assert!(!hyphae[0].active);
        let frozen = hyphae[0].segments.clone();
        advance_growth(
            &mut spores,
            &mut hyphae,
            &mut roots,
            &params,
            0.1,
            &mut ids,
            &mut rng,
        );
        assert_eq!(hyphae[0].segments, frozen);
    }
}
