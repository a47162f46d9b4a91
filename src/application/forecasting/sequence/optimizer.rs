use super::network::SequenceNetwork;
use ndarray::{ArrayD, Zip};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

/// Adam with bias-corrected first and second moment estimates.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    step: i32,
    first_moments: Vec<ArrayD<f64>>,
    second_moments: Vec<ArrayD<f64>>,
}

impl Adam {
    pub fn new(network: &SequenceNetwork, learning_rate: f64) -> Self {
        let zeros: Vec<ArrayD<f64>> = network
            .parameters()
            .iter()
            .map(|p| ArrayD::zeros(p.raw_dim()))
            .collect();

        Self {
            learning_rate,
            step: 0,
            first_moments: zeros.clone(),
            second_moments: zeros,
        }
    }

    pub fn step(&mut self, network: &mut SequenceNetwork, grads: &SequenceNetwork) {
        self.step = self.step.saturating_add(1);
        let correction1 = 1.0 - BETA1.powi(self.step);
        let correction2 = 1.0 - BETA2.powi(self.step);
        let lr = self.learning_rate;

        let moments = self.first_moments.iter_mut().zip(self.second_moments.iter_mut());
        for ((param, grad), (m, v)) in network
            .parameters_mut()
            .into_iter()
            .zip(grads.parameters())
            .zip(moments)
        {
            Zip::from(param)
                .and(&grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = BETA1 * *m + (1.0 - BETA1) * g;
                    *v = BETA2 * *v + (1.0 - BETA2) * g * g;
                    let m_hat = *m / correction1;
                    let v_hat = *v / correction2;
                    *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
                });
        }
    }
}
