//! ResNet Architecture
//!
//! Standard ResNet built from basic residual blocks. With `layers = [2, 2, 2, 2]`
//! and `base_width = 64` this is ResNet-18:
//! - Stem: Conv 7x7 stride 2, BatchNorm, ReLU, MaxPool 3x3 stride 2
//! - Stages of basic blocks; channels double and resolution halves from stage 2 on
//! - Global average pooling
//! - Linear classification head

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the ResNet model
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Number of output classes (default: 100 for CIFAR-100)
    #[config(default = "100")]
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Channels of the stem and first stage
    #[config(default = "64")]
    pub base_width: usize,

    /// Basic blocks per stage
    #[config(default = "vec![2, 2, 2, 2]")]
    pub layers: Vec<usize>,
}

impl ResNetConfig {
    /// Channels produced by the last stage
    pub fn output_width(&self) -> usize {
        self.base_width << self.layers.len().saturating_sub(1)
    }

    /// Initialize a model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        ResNet::new(self, device)
    }
}

/// 1x1 projection on the shortcut path when the block changes shape
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
}

impl<B: Backend> Downsample<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [1, 1])
            .with_stride([stride, stride])
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);

        Self { conv, bn }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

/// Two 3x3 convolutions with an identity (or projected) shortcut
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    downsample: Option<Downsample<B>>,
    relu: Relu,
}

impl<B: Backend> BasicBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        let downsample = (stride != 1 || in_channels != out_channels)
            .then(|| Downsample::new(in_channels, out_channels, stride, device));

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            downsample,
            relu: Relu::new(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(input.clone()),
            None => input.clone(),
        };

        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);
        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);

        self.relu.forward(x + identity)
    }
}

/// ResNet classifier network
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    maxpool: MaxPool2d,
    stages: Vec<Vec<BasicBlock<B>>>,
    avgpool: AdaptiveAvgPool2d,
    fc: Linear<B>,
    relu: Relu,
    num_classes: usize,
}

impl<B: Backend> ResNet<B> {
    /// Create a new ResNet from configuration
    pub fn new(config: &ResNetConfig, device: &B::Device) -> Self {
        let width = config.base_width;

        let conv1 = Conv2dConfig::new([config.in_channels, width], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(width).init(device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let mut stages = Vec::with_capacity(config.layers.len());
        let mut in_channels = width;
        for (index, &blocks) in config.layers.iter().enumerate() {
            let out_channels = width << index;
            let stride = if index == 0 { 1 } else { 2 };

            let stage = (0..blocks)
                .map(|block| {
                    let block_in = if block == 0 { in_channels } else { out_channels };
                    let block_stride = if block == 0 { stride } else { 1 };
                    BasicBlock::new(block_in, out_channels, block_stride, device)
                })
                .collect();
            stages.push(stage);
            in_channels = out_channels;
        }

        let avgpool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let fc = LinearConfig::new(config.output_width(), config.num_classes).init(device);

        Self {
            conv1,
            bn1,
            maxpool,
            stages,
            avgpool,
            fc,
            relu: Relu::new(),
            num_classes: config.num_classes,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, in_channels, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);
        let mut x = self.maxpool.forward(x);

        for stage in &self.stages {
            for block in stage {
                x = block.forward(x);
            }
        }

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.avgpool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        self.fc.forward(x)
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
