mod codec;
mod fixed_point;
