/// Piecewise-linear profile `y(t)` written as `"t y; t y; ..."`.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    knots: Vec<[f32; 2]>,
}

impl Profile {
    pub fn constant(y: f32) -> Self {
        Self {
            knots: vec![[0.0, y], [1.0, y]],
        }
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let mut knots = Vec::new();
        for chunk in text.split(';') {
            let cleaned = chunk.replace(',', " ");
            let mut iter = cleaned.split_whitespace();
            let (Some(t), Some(y)) = (iter.next(), iter.next()) else {
                if cleaned.trim().is_empty() {
                    continue;
                }
                return Err(format!("profile knot '{}' needs t and y", chunk.trim()));
            };
            let t = t
                .parse::<f32>()
                .map_err(|err| format!("profile knot '{}': {}", chunk.trim(), err))?;
            let y = y
                .parse::<f32>()
                .map_err(|err| format!("profile knot '{}': {}", chunk.trim(), err))?;
            if !t.is_finite() || !y.is_finite() {
                return Err(format!("profile knot '{}' is not finite", chunk.trim()));
            }
            knots.push([t, y]);
        }
        if knots.is_empty() {
            return Err("profile has no knots".to_string());
        }
        knots.sort_by(|a, b| a[0].total_cmp(&b[0]));
        Ok(Self { knots })
    }

    pub fn knots(&self) -> &[[f32; 2]] {
        &self.knots
    }

    /// Linear interpolation between knots, held constant past either end.
    pub fn sample(&self, t: f32) -> f32 {
        let (first, last) = match (self.knots.first(), self.knots.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t <= first[0] {
            return first[1];
        }
        if t >= last[0] {
            return last[1];
        }
        let upper = self.knots.partition_point(|knot| knot[0] <= t);
        let a = self.knots[upper - 1];
        let b = self.knots[upper];
        let span = b[0] - a[0];
        if span <= 0.0 {
            return b[1];
        }
        a[1] + (b[1] - a[1]) * ((t - a[0]) / span)
    }

    pub fn encode(&self) -> String {
        self.knots
            .iter()
            .map(|knot| format!("{} {}", knot[0], knot[1]))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
