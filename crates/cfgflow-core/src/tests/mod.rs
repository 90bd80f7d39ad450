/*! Cross-module tests for the dataflow engine and the bundled analyses.
 *
 * The unit tests next to each analysis cover straight-line code. These build branching and
 * looping functions, where merge groups, deduplicated edges and re-enqueueing actually matter.
 */

#![allow(unused_imports)]
#![allow(unused_variables)]


use crate::analysis::InstSet;
use crate::builder::{FunctionBuilder, InstBuilder};
use crate::function::Function;
use crate::values::{InstId, Operand};

pub(crate) fn set(items: &[usize]) -> InstSet {
    items.iter().copied().collect()
}

/// ```text
/// entry:  1 c = icmp %n, 0     2 a = add %n, 1     3 b = add %n, 2     4 br c, left, right
/// left:   5 br join
/// right:  6 br join
/// join:   7 x = phi [a, left], [b, right]          8 ret x
/// ```
pub(crate) fn diamond() -> Function {
    let mut b = FunctionBuilder::new("diamond");
    let n = b.param("n");
    b.block("entry");
    let left = b.create_block("left");
    let right = b.create_block("right");
    let join = b.create_block("join");

    let c = b.icmp(n.clone(), Operand::Const(0));
    let a = b.add(n.clone(), Operand::Const(1));
    let bv = b.add(n, Operand::Const(2));
    b.branch(c, left, right);

    b.switch_to_block(left).unwrap();
    b.jump(join);
    b.switch_to_block(right).unwrap();
    b.jump(join);

    b.switch_to_block(join).unwrap();
    let x = b.phi(vec![(a, left), (bv, right)]);
    b.ret(Some(x));
    b.build().unwrap()
}

/// ```text
/// entry:  1 i0 = add %n, 0     2 br loop
/// loop:   3 i = phi [i0, entry], [next, loop]
///         4 next = add i, 1    5 c = icmp next, 10    6 br c, loop, exit
/// exit:   7 ret next
/// ```
pub(crate) fn counting_loop() -> Function {
    let mut b = FunctionBuilder::new("loop");
    let n = b.param("n");
    let entry = b.block("entry");
    let body = b.create_block("loop");
    let exit = b.create_block("exit");

    let i0 = b.add(n, Operand::Const(0));
    b.jump(body);

    b.switch_to_block(body).unwrap();
    let next_id = InstId(b.next_inst_id().0 + 1);
    let i = b.phi(vec![(i0, entry), (Operand::Inst(next_id), body)]);
    let next = b.add(i, Operand::Const(1));
    assert_eq!(next, Operand::Inst(next_id));
    let c = b.icmp(next.clone(), Operand::Const(10));
    b.branch(c, body, exit);

    b.switch_to_block(exit).unwrap();
    b.ret(Some(next));
    b.build().unwrap()
}
