use ndarray::array;
use crate::activations::Activation;

#[test]
fn test_relu_activation() {
    let relu = Activation::Relu;
    let mut input = array![-1.0, 0.0, 1.0, 2.0];
    relu.apply(&mut input);
    assert_eq!(input, array![0.0, 0.0, 1.0, 2.0]);
}

#[test]
fn test_sigmoid_activation() {
    let sigmoid = Activation::Sigmoid;
    let mut input = array![0.0];
    sigmoid.apply(&mut input);
    assert!((input[0] - 0.5).abs() < 1e-6);
}

#[test]
fn test_tanh_activation() {
    let tanh = Activation::Tanh;
    let mut input = array![0.0];
    tanh.apply(&mut input);
    assert_eq!(input[0], 0.0);
}

#[test]
fn test_leaky_relu() {
    let leaky = Activation::LeakyRelu { alpha: 0.01 };
    let mut input = array![-1.0, 0.0, 1.0];
    leaky.apply(&mut input);
    assert_eq!(input, array![-0.01, 0.0, 1.0]);
}

#[test]
fn test_linear_is_identity() {
    let mut input = array![[-3.0, 0.5], [2.0, 7.0]];
    let expected = input.clone();
    Activation::Linear.apply(&mut input);
    assert_eq!(input, expected);
    assert_eq!(Activation::Linear.derivative(input.view()), array![[1.0, 1.0], [1.0, 1.0]]);
}

#[test]
fn test_activation_derivatives() {
    // ReLU derivative
    let relu = Activation::Relu;
    let pre_activation = array![-1.0, 0.0, 1.0, 2.0];
    assert_eq!(relu.derivative(pre_activation.view()), array![0.0, 0.0, 1.0, 1.0]);

    // LeakyReLU derivative
    let leaky = Activation::LeakyRelu { alpha: 0.1 };
    let pre_activation = array![-1.0, 0.0, 1.0];
    assert_eq!(leaky.derivative(pre_activation.view()), array![0.1, 0.1, 1.0]);

    // Sigmoid derivative peaks at 0.25
    let deriv = Activation::Sigmoid.derivative(array![0.0].view());
    assert!((deriv[0] - 0.25).abs() < 1e-6);

    // Tanh derivative is 1 at the origin
    let deriv = Activation::Tanh.derivative(array![0.0].view());
    assert!((deriv[0] - 1.0).abs() < 1e-6);
}

#[test]
fn test_extreme_inputs_stay_finite() {
    for activation in [
        Activation::Relu,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::LeakyRelu { alpha: 0.01 },
    ] {
        let mut values = array![1e10, -1e10, 0.0];
        activation.apply(&mut values);
        assert!(values.iter().all(|v| v.is_finite()), "{:?} produced {:?}", activation, values);
        let deriv = activation.derivative(array![1e10, -1e10, 0.0].view());
        assert!(deriv.iter().all(|v| v.is_finite()));
    }
}
