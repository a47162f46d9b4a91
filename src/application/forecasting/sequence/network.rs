//! Stacked LSTM regressor with a two-layer dense head
//!
//! Each LSTM layer keeps its four gates in one combined weight matrix of
//! shape `4H × (I + H)` acting on `[x_t; h_{t-1}]`, gate order
//! input, forget, candidate, output. Dropout is applied to every layer's
//! output sequence during training only. The last layer's final hidden
//! state feeds `Dense(dense_units)` and then a scalar `Dense(1)`, both linear.

use ndarray::linalg::general_mat_mul;
use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, ArrayViewMutD, Axis, s};
use rand::Rng;
use rand::rngs::StdRng;

/// Shape of a network, independent of its weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkShape {
    pub input_size: usize,
    pub hidden_units: usize,
    pub layers: usize,
    pub dense_units: usize,
    pub dropout: f64,
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn glorot_uniform(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..=limit))
}

/// `target += left ⊗ right`
fn add_outer(target: &mut Array2<f64>, left: &Array1<f64>, right: &Array1<f64>) {
    let column = left.view().insert_axis(Axis(1));
    let row = right.view().insert_axis(Axis(0));
    general_mat_mul(1.0, &column, &row, 1.0, target);
}

#[derive(Debug, Clone)]
struct Gates {
    input: Array1<f64>,
    forget: Array1<f64>,
    candidate: Array1<f64>,
    output: Array1<f64>,
}

/// Forward activations of one layer over a whole window.
#[derive(Debug, Clone, Default)]
struct LayerTrace {
    stacked_inputs: Vec<Array1<f64>>,
    gates: Vec<Gates>,
    cells: Vec<Array1<f64>>,
    outputs: Vec<Array1<f64>>,
}

#[derive(Debug, Clone)]
struct LstmLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
    input_size: usize,
    hidden_size: usize,
}

impl LstmLayer {
    fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let weights = glorot_uniform(4 * hidden_size, input_size + hidden_size, rng);
        let mut bias = Array1::zeros(4 * hidden_size);
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            weights,
            bias,
            input_size,
            hidden_size,
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            weights: Array2::zeros(self.weights.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
            input_size: self.input_size,
            hidden_size: self.hidden_size,
        }
    }

    fn forward(&self, inputs: &[Array1<f64>]) -> LayerTrace {
        let h = self.hidden_size;
        let mut trace = LayerTrace::default();
        let mut h_prev = Array1::zeros(h);
        let mut c_prev = Array1::zeros(h);

        for x in inputs {
            let mut stacked = Array1::zeros(self.input_size + h);
            stacked.slice_mut(s![..self.input_size]).assign(x);
            stacked.slice_mut(s![self.input_size..]).assign(&h_prev);

            let activation = self.weights.dot(&stacked) + &self.bias;
            let gates = Gates {
                input: activation.slice(s![..h]).mapv(sigmoid),
                forget: activation.slice(s![h..2 * h]).mapv(sigmoid),
                candidate: activation.slice(s![2 * h..3 * h]).mapv(f64::tanh),
                output: activation.slice(s![3 * h..]).mapv(sigmoid),
            };

            let cell = &gates.forget * &c_prev + &gates.input * &gates.candidate;
            let hidden = &gates.output * &cell.mapv(f64::tanh);

            trace.stacked_inputs.push(stacked);
            trace.gates.push(gates);
            trace.cells.push(cell.clone());
            trace.outputs.push(hidden.clone());

            h_prev = hidden;
            c_prev = cell;
        }

        trace
    }

    /// Back-propagation through time. Returns the gradient with respect to
    /// each input step.
    fn backward(
        &self,
        trace: &LayerTrace,
        d_outputs: &[Array1<f64>],
        grads: &mut LstmLayer,
    ) -> Vec<Array1<f64>> {
        let h = self.hidden_size;
        let steps = trace.outputs.len();
        let zeros = Array1::zeros(h);
        let mut d_inputs = vec![Array1::zeros(self.input_size); steps];
        let mut dh_next = Array1::zeros(h);
        let mut dc_next = Array1::zeros(h);

        for t in (0..steps).rev() {
            let gates = &trace.gates[t];
            let c_prev = if t == 0 { &zeros } else { &trace.cells[t - 1] };
            let tanh_c = trace.cells[t].mapv(f64::tanh);

            let dh = &d_outputs[t] + &dh_next;
            let d_output = &dh * &tanh_c;
            let dc = &dh * &gates.output * &tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let d_input = &dc * &gates.candidate;
            let d_candidate = &dc * &gates.input;
            let d_forget = &dc * c_prev;
            dc_next = &dc * &gates.forget;

            let mut d_activation = Array1::zeros(4 * h);
            d_activation
                .slice_mut(s![..h])
                .assign(&(&d_input * &gates.input.mapv(|v| v * (1.0 - v))));
            d_activation
                .slice_mut(s![h..2 * h])
                .assign(&(&d_forget * &gates.forget.mapv(|v| v * (1.0 - v))));
            d_activation
                .slice_mut(s![2 * h..3 * h])
                .assign(&(&d_candidate * &gates.candidate.mapv(|v| 1.0 - v * v)));
            d_activation
                .slice_mut(s![3 * h..])
                .assign(&(&d_output * &gates.output.mapv(|v| v * (1.0 - v))));

            add_outer(&mut grads.weights, &d_activation, &trace.stacked_inputs[t]);
            grads.bias += &d_activation;

            let d_stacked = self.weights.t().dot(&d_activation);
            d_inputs[t].assign(&d_stacked.slice(s![..self.input_size]));
            dh_next = d_stacked.slice(s![self.input_size..]).to_owned();
        }

        d_inputs
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl DenseLayer {
    fn new(input_size: usize, output_size: usize, rng: &mut StdRng) -> Self {
        Self {
            weights: glorot_uniform(output_size, input_size, rng),
            bias: Array1::zeros(output_size),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            weights: Array2::zeros(self.weights.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(x) + &self.bias
    }

    fn backward(&self, x: &Array1<f64>, d_out: &Array1<f64>, grads: &mut DenseLayer) -> Array1<f64> {
        add_outer(&mut grads.weights, d_out, x);
        grads.bias += d_out;
        self.weights.t().dot(d_out)
    }
}

/// LSTM stack plus dense head. Also used as a same-shaped gradient buffer.
#[derive(Debug, Clone)]
pub struct SequenceNetwork {
    layers: Vec<LstmLayer>,
    hidden: DenseLayer,
    output: DenseLayer,
    dropout: f64,
}

impl SequenceNetwork {
    pub fn new(shape: NetworkShape, rng: &mut StdRng) -> Self {
        let mut layers = Vec::with_capacity(shape.layers);
        let mut input_size = shape.input_size;
        for _ in 0..shape.layers {
            layers.push(LstmLayer::new(input_size, shape.hidden_units, rng));
            input_size = shape.hidden_units;
        }

        Self {
            layers,
            hidden: DenseLayer::new(input_size, shape.dense_units, rng),
            output: DenseLayer::new(shape.dense_units, 1, rng),
            dropout: shape.dropout,
        }
    }

    /// Zero-valued network with identical parameter shapes.
    pub fn zeros_like(&self) -> Self {
        Self {
            layers: self.layers.iter().map(LstmLayer::zeros_like).collect(),
            hidden: self.hidden.zeros_like(),
            output: self.output.zeros_like(),
            dropout: self.dropout,
        }
    }

    /// Every parameter tensor in a fixed order.
    pub fn parameters(&self) -> Vec<ArrayViewD<'_, f64>> {
        let mut params = Vec::with_capacity(2 * self.layers.len() + 4);
        for layer in &self.layers {
            params.push(layer.weights.view().into_dyn());
            params.push(layer.bias.view().into_dyn());
        }
        params.push(self.hidden.weights.view().into_dyn());
        params.push(self.hidden.bias.view().into_dyn());
        params.push(self.output.weights.view().into_dyn());
        params.push(self.output.bias.view().into_dyn());
        params
    }

    /// Mutable counterpart of [`SequenceNetwork::parameters`], same order.
    pub fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        let mut params = Vec::with_capacity(2 * self.layers.len() + 4);
        for layer in &mut self.layers {
            params.push(layer.weights.view_mut().into_dyn());
            params.push(layer.bias.view_mut().into_dyn());
        }
        params.push(self.hidden.weights.view_mut().into_dyn());
        params.push(self.hidden.bias.view_mut().into_dyn());
        params.push(self.output.weights.view_mut().into_dyn());
        params.push(self.output.bias.view_mut().into_dyn());
        params
    }

    fn final_width(&self) -> usize {
        self.layers
            .last()
            .map_or(self.hidden.weights.ncols(), |l| l.hidden_size)
    }

    /// Inference pass without dropout. `window` is `steps × features`.
    pub fn predict(&self, window: ArrayView2<'_, f64>) -> f64 {
        let mut sequence: Vec<Array1<f64>> = window.outer_iter().map(|r| r.to_owned()).collect();
        for layer in &self.layers {
            sequence = layer.forward(&sequence).outputs;
        }

        let last = sequence
            .pop()
            .unwrap_or_else(|| Array1::zeros(self.final_width()));
        self.output.forward(&self.hidden.forward(&last))[0]
    }

    fn dropout_mask(&self, len: usize, rng: &mut StdRng) -> Array1<f64> {
        if self.dropout <= 0.0 {
            return Array1::ones(len);
        }
        let keep_scale = 1.0 / (1.0 - self.dropout);
        Array1::from_shape_fn(len, |_| {
            if rng.random::<f64>() < self.dropout {
                0.0
            } else {
                keep_scale
            }
        })
    }

    /// Training pass for one sample: forward with dropout, then add the
    /// gradient of `loss_scale · (ŷ − target)²` into `grads`.
    ///
    /// Returns the prediction made under dropout.
    pub fn accumulate_gradients(
        &self,
        window: ArrayView2<'_, f64>,
        target: f64,
        loss_scale: f64,
        rng: &mut StdRng,
        grads: &mut SequenceNetwork,
    ) -> f64 {
        let steps = window.nrows();
        let mut sequence: Vec<Array1<f64>> = window.outer_iter().map(|r| r.to_owned()).collect();
        let mut traces = Vec::with_capacity(self.layers.len());
        let mut masks = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let trace = layer.forward(&sequence);
            let layer_masks: Vec<Array1<f64>> = trace
                .outputs
                .iter()
                .map(|h| self.dropout_mask(h.len(), rng))
                .collect();
            sequence = trace
                .outputs
                .iter()
                .zip(&layer_masks)
                .map(|(h, mask)| h * mask)
                .collect();
            traces.push(trace);
            masks.push(layer_masks);
        }

        let last = sequence
            .pop()
            .unwrap_or_else(|| Array1::zeros(self.final_width()));
        let dense_out = self.hidden.forward(&last);
        let prediction = self.output.forward(&dense_out)[0];

        let d_prediction = Array1::from_elem(1, loss_scale * 2.0 * (prediction - target));
        let d_dense = self
            .output
            .backward(&dense_out, &d_prediction, &mut grads.output);
        let d_last = self.hidden.backward(&last, &d_dense, &mut grads.hidden);

        let mut d_outputs: Vec<Array1<f64>> = vec![Array1::zeros(d_last.len()); steps];
        if let Some(slot) = d_outputs.last_mut() {
            *slot = d_last;
        }

        for (idx, layer) in self.layers.iter().enumerate().rev() {
            let masked: Vec<Array1<f64>> = d_outputs
                .iter()
                .zip(&masks[idx])
                .map(|(d, mask)| d * mask)
                .collect();
            d_outputs = layer.backward(&traces[idx], &masked, &mut grads.layers[idx]);
        }

        prediction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn tiny_shape(dropout: f64) -> NetworkShape {
        NetworkShape {
            input_size: 3,
            hidden_units: 4,
            layers: 2,
            dense_units: 3,
            dropout,
        }
    }

    fn sample_window() -> Array2<f64> {
        Array2::from_shape_fn((5, 3), |(t, k)| ((t * 3 + k) as f64 * 0.37).sin() * 0.5 + 0.5)
    }

    fn loss(network: &SequenceNetwork, window: &Array2<f64>, target: f64) -> f64 {
        (network.predict(window.view()) - target).powi(2)
    }

    #[test]
    fn test_parameter_views_align_with_gradients() {
        let mut rng = StdRng::seed_from_u64(1);
        let network = SequenceNetwork::new(tiny_shape(0.2), &mut rng);
        let grads = network.zeros_like();

        let shapes: Vec<_> = network.parameters().iter().map(|p| p.shape().to_vec()).collect();
        let grad_shapes: Vec<_> = grads.parameters().iter().map(|p| p.shape().to_vec()).collect();
        assert_eq!(shapes, grad_shapes);
        assert_eq!(shapes.len(), 8);
        assert_eq!(shapes[0], vec![16, 7]);
        assert!(grads.parameters().iter().all(|p| p.iter().all(|v| *v == 0.0)));
    }

    #[test]
    fn test_forget_gate_bias_starts_at_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let network = SequenceNetwork::new(tiny_shape(0.0), &mut rng);
        let bias = &network.parameters()[1];
        let values: Vec<f64> = bias.iter().copied().collect();
        assert_eq!(&values[..4], &[0.0; 4]);
        assert_eq!(&values[4..8], &[1.0; 4]);
        assert_eq!(&values[8..], &[0.0; 8]);
    }

    #[test]
    fn test_zero_input_gives_zero_output() {
        let mut rng = StdRng::seed_from_u64(9);
        let network = SequenceNetwork::new(tiny_shape(0.2), &mut rng);
        let window = Array2::zeros((6, 3));
        assert_eq!(network.predict(window.view()), 0.0);
    }

    #[test]
    fn test_analytic_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = SequenceNetwork::new(tiny_shape(0.0), &mut rng);
        let window = sample_window();
        let target = 0.8;

        let mut grads = network.zeros_like();
        network.accumulate_gradients(window.view(), target, 1.0, &mut rng, &mut grads);
        let analytic: Vec<Vec<f64>> = grads
            .parameters()
            .iter()
            .map(|p| p.iter().copied().collect())
            .collect();

        let epsilon = 1e-6;
        for (param_idx, values) in analytic.iter().enumerate() {
            for idx in [0, values.len() / 2, values.len() - 1] {
                let mut plus = network.clone();
                if let Some(v) = plus.parameters_mut()[param_idx].iter_mut().nth(idx) {
                    *v += epsilon;
                }
                let mut minus = network.clone();
                if let Some(v) = minus.parameters_mut()[param_idx].iter_mut().nth(idx) {
                    *v -= epsilon;
                }

                let numeric =
                    (loss(&plus, &window, target) - loss(&minus, &window, target)) / (2.0 * epsilon);
                let diff = (numeric - values[idx]).abs();
                assert!(
                    diff < 1e-5 + 1e-3 * numeric.abs(),
                    "param {} index {}: analytic {} numeric {}",
                    param_idx,
                    idx,
                    values[idx],
                    numeric
                );
            }
        }
    }

    #[test]
    fn test_dropout_only_affects_training_pass() {
        let mut rng = StdRng::seed_from_u64(4);
        let network = SequenceNetwork::new(tiny_shape(0.5), &mut rng);
        let window = sample_window();

        let first = network.predict(window.view());
        let second = network.predict(window.view());
        assert_eq!(first, second);
    }
}
