/// Running sum of `v^power` over the measurement phase of one chain.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub count: usize,
    pub aggregate: f64,
    pub power: i32,
}

impl Statistics {
    pub fn new(power: i32) -> Self {
        Self {
            count: 0,
            aggregate: 0.0,
            power,
        }
    }

    #[inline]
    pub fn update(&mut self, v: f64) {
        self.count += 1;
        self.aggregate += if self.power == 1 { v } else { v.powi(self.power) };
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.aggregate / self.count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moments() {
        let mut first = Statistics::new(1);
        let mut second = Statistics::new(2);
        for v in [-4.0, 0.0, 2.0, 6.0] {
            first.update(v);
            second.update(v);
        }
        assert_eq!(first.average(), 1.0);
        assert_eq!(second.average(), 14.0);
    }

    #[test]
    fn test_empty_average_is_zero() {
        assert_eq!(Statistics::new(2).average(), 0.0);

        let stale = Statistics {
            count: 0,
            aggregate: 5.0,
            power: 1,
        };
        assert_eq!(stale.average(), 0.0);
    }
}
