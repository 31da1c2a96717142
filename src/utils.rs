/// Simplest statistics over a series: min / max / mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Summary of a slice of f32. An empty slice gives zeros.
pub fn vec_stats(xs: &[f32]) -> Stats {
    if xs.is_empty() {
        return Stats { min: 0.0, max: 0.0, mean: 0.0 };
    }
    let mut mn = xs[0];
    let mut mx = xs[0];
    let mut sum = 0.0f64;
    for &v in xs {
        if v < mn {
            mn = v;
        }
        if v > mx {
            mx = v;
        }
        sum += v as f64;
    }
    Stats {
        min: mn,
        max: mx,
        mean: (sum / xs.len() as f64) as f32,
    }
}

pub fn has_non_finite(xs: &[f32]) -> bool {
    xs.iter().any(|&v| !v.is_finite())
}
