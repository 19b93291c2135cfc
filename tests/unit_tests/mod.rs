mod assembly;
mod element;
mod qfunction;
mod quadrature;
mod tensor;
