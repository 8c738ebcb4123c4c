use burn::{
    module::{Ignored, Param},
    nn::{Dropout, DropoutConfig, Initializer},
    prelude::*,
};
pub use burn::backend::ndarray::{NdArray as DefaultBackend, NdArrayDevice as DefaultDevice};

mod functional;
pub use functional::{scaled_dot_product_attention, stable_softmax, SoftmaxAxis};

#[derive(Config, Debug)]
pub struct MhaConfig {
    pub d_model: usize,
    pub n_heads: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    #[config(default = true)]
    pub bias: bool,
    /// Axis the attention weights are normalized over.
    #[config(default = "SoftmaxAxis::Keys")]
    pub softmax_axis: SoftmaxAxis,
    /// Initializer for the per-head Q/K/V projection weights.
    #[config(default = "Initializer::XavierNormal { gain: 1.0 }")]
    pub projection_initializer: Initializer,
    /// Initializer for the output projection and its bias: uniform with the
    /// conventional 1/sqrt(fan_in) bound.
    #[config(default = "Initializer::KaimingUniform { gain: 1.0 / 3.0f64.sqrt(), fan_out_only: false }")]
    pub output_initializer: Initializer,
}

impl MhaConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiHeadAttentionCore<B> {
        assert!(
            self.d_model % self.n_heads == 0,
            "d_model ({}) must be divisible by n_heads ({})",
            self.d_model,
            self.n_heads
        );
        let d_head = self.d_model / self.n_heads;

        // One [d_model, d_head] projection per head, applied as a batched
        // matmul with the input broadcast along the head axis.
        let w_query = self.projection_initializer.init_with(
            [self.n_heads, self.d_model, d_head],
            Some(self.d_model),
            Some(d_head),
            device,
        );
        let w_key = self.projection_initializer.init_with(
            [self.n_heads, self.d_model, d_head],
            Some(self.d_model),
            Some(d_head),
            device,
        );
        let w_value = self.projection_initializer.init_with(
            [self.n_heads, self.d_model, d_head],
            Some(self.d_model),
            Some(d_head),
            device,
        );

        // Merged heads (n_heads * d_head == d_model) back to the model width.
        let w_output = self.output_initializer.init_with(
            [self.d_model, self.d_model],
            Some(self.d_model),
            Some(self.d_model),
            device,
        );
        let b_output = self.bias.then(|| {
            self.output_initializer
                .init_with([self.d_model], Some(self.d_model), None, device)
        });

        let dropout = DropoutConfig::new(self.dropout).init();

        MultiHeadAttentionCore {
            w_query,
            w_key,
            w_value,
            w_output,
            b_output,
            dropout,
            softmax_axis: Ignored(self.softmax_axis.clone()),
            n_heads: self.n_heads,
            d_head,
            d_model: self.d_model,
        }
    }
}

/// Multi-head attention over a single `[seq_len, d_model]` sequence.
///
/// Holds the learned projection tensors explicitly; the attention math itself
/// lives in [`scaled_dot_product_attention`].
#[derive(Module, Debug)]
pub struct MultiHeadAttentionCore<B: Backend> {
    w_query: Param<Tensor<B, 3>>,
    w_key: Param<Tensor<B, 3>>,
    w_value: Param<Tensor<B, 3>>,
    w_output: Param<Tensor<B, 2>>,
    b_output: Option<Param<Tensor<B, 1>>>,
    /// Not applied in the forward pass.
    dropout: Dropout,
    softmax_axis: Ignored<SoftmaxAxis>,
    n_heads: usize,
    d_head: usize,
    d_model: usize,
}

impl<B: Backend> MultiHeadAttentionCore<B> {
    /// Construct a module using an explicit device.
    pub fn new(d_model: usize, n_heads: usize, device: &B::Device) -> Self {
        MhaConfig::new(d_model, n_heads).init(device)
    }

    /// Forward pass: `[seq_len, d_model]` in, `[seq_len, d_model]` out.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [seq_len, d_model_in] = input.dims();

        debug_assert_eq!(d_model_in, self.d_model, "Input embedding dim must match config");

        // 1. Broadcast across heads and project: [n_heads, seq_len, d_head] each.
        let heads_view = input.unsqueeze::<3>().repeat(&[self.n_heads, 1, 1]);
        let q = heads_view.clone().matmul(self.w_query.val());
        let k = heads_view.clone().matmul(self.w_key.val());
        let v = heads_view.matmul(self.w_value.val());
        log::debug!("projected q/k/v dims: {:?}", q.dims());

        // 2. Scaled Dot-Product Attention
        let (context, weights) =
            scaled_dot_product_attention(q, k, v, self.softmax_axis.0.clone());
        log::debug!(
            "attention weights dims: {:?}, context dims: {:?}",
            weights.dims(),
            context.dims()
        );

        // 3. Merge heads along the feature axis: [seq_len, n_heads * d_head].
        let merged = context.swap_dims(0, 1).reshape([seq_len, self.d_model]);

        // 4. Output projection.
        let output = merged.matmul(self.w_output.val());
        let output = match &self.b_output {
            Some(bias) => output + bias.val().unsqueeze::<2>(),
            None => output,
        };
        log::debug!("output dims: {:?}", output.dims());

        output
    }
}

/// Wrapper to provide a simple, PyTorch-like API with default backend handling.
pub struct MultiHeadAttention {
    model: MultiHeadAttentionCore<DefaultBackend>,
    device: DefaultDevice,
}

impl MultiHeadAttention {
    pub fn new(d_model: usize, n_heads: usize) -> Self {
        let device = DefaultDevice::default();
        let model = MultiHeadAttentionCore::<DefaultBackend>::new(d_model, n_heads, &device);
        Self { model, device }
    }

    pub fn with_device(d_model: usize, n_heads: usize, device: DefaultDevice) -> Self {
        let model = MultiHeadAttentionCore::<DefaultBackend>::new(d_model, n_heads, &device);
        Self { model, device }
    }

    pub fn forward(&self, input: Tensor<DefaultBackend, 2>) -> Tensor<DefaultBackend, 2> {
        self.model.forward(input)
    }

    pub fn device(&self) -> &DefaultDevice {
        &self.device
    }

    pub fn inner(&self) -> &MultiHeadAttentionCore<DefaultBackend> {
        &self.model
    }
}
