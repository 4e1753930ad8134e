pub mod frame_evaluator;
