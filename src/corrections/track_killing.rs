use crate::histoer::{HistEntry, HistKey, Histogram, Histogram2D, HistogramRegistry};

/// Symmetrize the track-killing systematic. Only the downward variation is
/// filled from the input files; the upward one is mirrored around the
/// nominal as `up = 2 * nominal - down`, carrying the down variances.
pub fn generate_up_histograms(registry: &mut HistogramRegistry) {
    let down_keys: Vec<HistKey> = registry
        .keys()
        .filter(|key| key.label.ends_with("_track_down"))
        .cloned()
        .collect();

    for down_key in down_keys {
        let nominal_label = down_key
            .label
            .strip_suffix("_track_down")
            .unwrap_or(&down_key.label)
            .to_string();
        let nominal_key = HistKey::new(&down_key.observable, down_key.region, &nominal_label);
        let up_key = HistKey::new(
            &down_key.observable,
            down_key.region,
            &format!("{}_track_up", nominal_label),
        );

        let entry = match (registry.get(&nominal_key), registry.get(&down_key)) {
            (Some(HistEntry::H1(nominal)), Some(HistEntry::H1(down))) => {
                HistEntry::H1(mirror_1d(nominal, down, &up_key.render()))
            }
            (Some(HistEntry::H2(nominal)), Some(HistEntry::H2(down))) => {
                HistEntry::H2(mirror_2d(nominal, down, &up_key.render()))
            }
            _ => {
                log::error!(
                    "No nominal counterpart for '{}', skipping track-up mirror",
                    down_key.render()
                );
                continue;
            }
        };
        registry.insert(up_key, entry);
    }
}

fn mirror_1d(nominal: &Histogram, down: &Histogram, name: &str) -> Histogram {
    let mut up = nominal.clone();
    up.name = name.to_string();
    for i in 0..up.bins.len() {
        up.bins[i] = 2.0 * nominal.bins[i] - down.bins[i];
        up.variances[i] = down.variances[i];
    }
    up.underflow = (
        2.0 * nominal.underflow.0 - down.underflow.0,
        down.underflow.1,
    );
    up.overflow = (2.0 * nominal.overflow.0 - down.overflow.0, down.overflow.1);
    up
}

fn mirror_2d(nominal: &Histogram2D, down: &Histogram2D, name: &str) -> Histogram2D {
    let mut up = nominal.clone();
    up.name = name.to_string();
    up.bins.counts.clear();

    let mut occupied: Vec<(usize, usize)> = nominal.bins.counts.keys().copied().collect();
    for index in down.bins.counts.keys() {
        if !nominal.bins.counts.contains_key(index) {
            occupied.push(*index);
        }
    }
    for index in occupied {
        let (n, _) = nominal.bins.counts.get(&index).copied().unwrap_or((0.0, 0.0));
        let (d, d_var) = down.bins.counts.get(&index).copied().unwrap_or((0.0, 0.0));
        up.bins.counts.insert(index, (2.0 * n - d, d_var));
    }
    up.underflow = (
        2.0 * nominal.underflow.0 - down.underflow.0,
        down.underflow.1,
    );
    up.overflow = (2.0 * nominal.overflow.0 - down.overflow.0, down.overflow.1);
    up
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histoer::RegionId;

    #[test]
    fn mirrors_down_around_nominal() {
        let mut registry = HistogramRegistry::new();
        let nominal = HistKey::new("ntracks", RegionId::Inclusive, "Cluster");
        let down = HistKey::new("ntracks", RegionId::Inclusive, "Cluster_track_down");
        registry.book_1d(nominal.clone(), 2, (0.0, 2.0));
        registry.book_1d(down.clone(), 2, (0.0, 2.0));

        if let Some(HistEntry::H1(h)) = registry.get_mut(&nominal) {
            h.fill(0.5, 10.0);
        }
        if let Some(HistEntry::H1(h)) = registry.get_mut(&down) {
            h.fill(0.5, 8.0);
        }

        generate_up_histograms(&mut registry);

        let up = HistKey::new("ntracks", RegionId::Inclusive, "Cluster_track_up");
        match registry.get(&up) {
            Some(HistEntry::H1(h)) => {
                assert_eq!(h.bins[0], 12.0);
                assert_eq!(h.variances[0], 64.0);
                assert_eq!(h.name, "ntracks_Cluster_track_up");
            }
            _ => panic!("missing up histogram"),
        }
    }

    #[test]
    fn mirrors_sparse_2d_bins() {
        let mut registry = HistogramRegistry::new();
        let nominal = HistKey::new("ABCDvars", RegionId::Inclusive, "Cluster");
        let down = HistKey::new("ABCDvars", RegionId::Inclusive, "Cluster_track_down");
        registry.book_2d(nominal.clone(), (2, 2), ((0.0, 1.0), (0.0, 1.0)));
        registry.book_2d(down.clone(), (2, 2), ((0.0, 1.0), (0.0, 1.0)));

        if let Some(HistEntry::H2(h)) = registry.get_mut(&nominal) {
            h.fill(0.25, 0.25, 5.0);
        }
        if let Some(HistEntry::H2(h)) = registry.get_mut(&down) {
            h.fill(0.25, 0.25, 3.0);
            h.fill(0.75, 0.75, 2.0);
        }

        generate_up_histograms(&mut registry);

        let up = HistKey::new("ABCDvars", RegionId::Inclusive, "Cluster_track_up");
        match registry.get(&up) {
            Some(HistEntry::H2(h)) => {
                assert_eq!(h.bins.counts.get(&(0, 0)), Some(&(7.0, 9.0)));
                assert_eq!(h.bins.counts.get(&(1, 1)), Some(&(-2.0, 4.0)));
            }
            _ => panic!("missing up histogram"),
        }
    }
}
