/*! Fluent API for constructing functions programmatically.
 *
 * Tests and front ends build functions block by block. The builder numbers instructions, keeps
 * merge-instructions at the head of their block, and derives predecessor and successor lists
 * once the function is finished.
 */

pub mod function_builder;
pub mod inst_builder;

pub use function_builder::FunctionBuilder;
pub use inst_builder::InstBuilder;
