use crate::foundation::core::Rgb8;

/// Euclidean distance in RGB space.
pub fn color_distance(a: Rgb8, b: Rgb8) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (f64::from(*x) - f64::from(y)).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// For each item, the ids of the `k` closest others by dominant colour.
///
/// Ties are broken by id. The relation is not symmetric: `a` listing `b`
/// says nothing about `b` listing `a`.
pub fn nearest_neighbors(items: &[(String, Rgb8)], k: usize) -> Vec<Vec<String>> {
    items
        .iter()
        .enumerate()
        .map(|(i, (_, color))| {
            let mut ranked: Vec<(f64, &str)> = items
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (id, other))| (color_distance(*color, *other), id.as_str()))
                .collect();
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            ranked.into_iter().take(k).map(|(_, id)| id.to_owned()).collect()
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/graph/navigate.rs"]
mod tests;
