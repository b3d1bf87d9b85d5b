//! Terminal rendering of peak columns

use crate::selection::Interval;

/// Render min/max columns as block characters, `height` rows tall
pub fn render_ascii(mins: &[f32], maxs: &[f32], height: usize) -> Vec<String> {
    let h = height.max(4);
    let width = mins.len().min(maxs.len());
    let mut lines = vec![vec![' '; width]; h];
    let to_row = |v: f32| -> usize {
        let clamped = v.clamp(-1.0, 1.0);
        let y = (0.5 - 0.5 * clamped) * (h as f32 - 1.0);
        y.round() as usize
    };
    for x in 0..width {
        let y1 = to_row(maxs[x]);
        let y0 = to_row(mins[x]);
        let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        for row in lines.iter_mut().take(b + 1).skip(a) {
            row[x] = '█';
        }
    }
    lines.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// One row marking which columns fall inside any of `regions`
pub fn region_ruler(width: usize, duration_secs: f64, regions: &[Interval]) -> String {
    if width == 0 || duration_secs <= 0.0 {
        return String::new();
    }
    (0..width)
        .map(|x| {
            let t = (x as f64 + 0.5) / width as f64 * duration_secs;
            if regions.iter().any(|r| t >= r.start && t <= r.end) {
                '='
            } else {
                '-'
            }
        })
        .collect()
}
