//! Worked-example programs.
//!
//! Blocks are numbered from `bb0`; a comment on each constructor shows the
//! program in surface syntax next to the expected verdict.

use fc_mir::{
    BasicBlock, BinOp, Body, BodyBuilder, BorrowKind, Constant, FnSig, LocalId, MirResult,
    Operand, Place, Rvalue, Ty,
};

/// `local = local + 1`
fn increment(b: &mut BodyBuilder, block: BasicBlock, local: LocalId) {
    b.assign(
        block,
        local,
        Rvalue::BinaryOp {
            op: BinOp::Add,
            left: Operand::Copy(Place::from_local(local)),
            right: Operand::Const(Constant::Int(1)),
        },
    );
}

/// ```text
/// let p = &mut v;
/// x += 1;          // accepted
/// p.push(&x);
/// x += 1;          // rejected: `v` holds the loan of `x`
/// consume(v);
/// ```
///
/// `push` takes `&mut Vec<&'e int>` and `&'e int`, so the element origin
/// of `p` is tied to the loan of `x`. Invariance then pushes that loan
/// backwards into `v` before it exists; only the active-loan dataflow keeps
/// the first increment legal.
pub fn vec_push() -> MirResult<Body> {
    let mut b = BodyBuilder::new("vec_push");
    let v_elem = b.origin("v");
    let p_outer = b.origin("p");
    let p_elem = b.origin("pv");
    let t_origin = b.origin("t");
    let borrow_v = b.origin("0");
    let borrow_x = b.origin("1");
    let push_self = b.origin("push_self");
    let push_elem = b.origin("push_elem");
    let consume_elem = b.origin("consume_elem");

    let vec_of = |b: &BodyBuilder, elem| b.adt_ty("Vec", vec![Ty::shared_ref(elem, Ty::Int)]);
    let v_ty = vec_of(&b, v_elem);
    let p_ty = Ty::mut_ref(p_outer, vec_of(&b, p_elem));
    let push = FnSig {
        inputs: vec![
            Ty::mut_ref(push_self, vec_of(&b, push_elem)),
            Ty::shared_ref(push_elem, Ty::Int),
        ],
        output: Ty::Unit,
    };
    let consume = FnSig {
        inputs: vec![vec_of(&b, consume_elem)],
        output: Ty::Unit,
    };

    let x = b.local("x", Ty::Int);
    let v = b.local("v", v_ty);
    let p = b.local("p", p_ty);
    let t = b.local("t", Ty::shared_ref(t_origin, Ty::Int));
    let pushed = b.local("pushed", Ty::Unit);
    let consumed = b.local("consumed", Ty::Unit);

    let bb0 = b.block();
    let bb1 = b.block();
    let bb2 = b.block();

    b.borrow(bb0, p, borrow_v, BorrowKind::Mutable, v);
    increment(&mut b, bb0, x);
    b.borrow(bb0, t, borrow_x, BorrowKind::Shared, x);
    let args = vec![Operand::Move(p.into()), Operand::Move(t.into())];
    b.call(bb0, "push", push, args, pushed, Some(bb1));

    increment(&mut b, bb1, x);
    b.call(bb1, "consume", consume, vec![Operand::Move(v.into())], consumed, Some(bb2));

    b.ret(bb2);
    b.finish()
}

/// ```text
/// let p = &x;
/// if c { p = &y; x += 1; }   // accepted: `p` no longer holds the loan of `x`
/// let z = *p;
/// ```
pub fn two_branch() -> MirResult<Body> {
    let mut b = BodyBuilder::new("two_branch");
    let p_origin = b.origin("p");
    let borrow_x = b.origin("0");
    let borrow_y = b.origin("1");

    let c = b.local("c", Ty::Bool);
    let x = b.local("x", Ty::Int);
    let y = b.local("y", Ty::Int);
    let p = b.local("p", Ty::shared_ref(p_origin, Ty::Int));
    let z = b.local("z", Ty::Int);

    let bb0 = b.block();
    let bb1 = b.block();
    let bb2 = b.block();
    let bb3 = b.block();

    b.borrow(bb0, p, borrow_x, BorrowKind::Shared, x);
    b.switch(bb0, Operand::Copy(c.into()), vec![bb1, bb2]);

    b.borrow(bb1, p, borrow_y, BorrowKind::Shared, y);
    increment(&mut b, bb1, x);
    b.goto(bb1, bb3);

    b.goto(bb2, bb3);

    b.copy(bb3, z, Place::from_local(p).deref());
    b.ret(bb3);
    b.finish()
}

/// ```text
/// bb0: p = &x; q = &y; if c goto bb1 else bb2
/// bb1: p = q; x += 1; goto bb3
/// bb2: y += 1; goto bb3
/// bb3: z = *p; y += 1; return          (read_first)
/// bb3: y += 1; z = *p; return          (otherwise)
/// ```
///
/// Reading `p` before mutating `y` is accepted on every path. Mutating `y`
/// first is rejected: along `bb1`, `p` still holds the loan of `y`.
pub fn join_scenario(read_first: bool) -> MirResult<Body> {
    let name = if read_first {
        "read_then_mutate"
    } else {
        "mutate_then_read"
    };
    let mut b = BodyBuilder::new(name);
    let p_origin = b.origin("p");
    let q_origin = b.origin("q");
    let borrow_x = b.origin("0");
    let borrow_y = b.origin("1");

    let c = b.local("c", Ty::Bool);
    let x = b.local("x", Ty::Int);
    let y = b.local("y", Ty::Int);
    let p = b.local("p", Ty::shared_ref(p_origin, Ty::Int));
    let q = b.local("q", Ty::shared_ref(q_origin, Ty::Int));
    let z = b.local("z", Ty::Int);

    let bb0 = b.block();
    let bb1 = b.block();
    let bb2 = b.block();
    let bb3 = b.block();

    b.borrow(bb0, p, borrow_x, BorrowKind::Shared, x);
    b.borrow(bb0, q, borrow_y, BorrowKind::Shared, y);
    b.switch(bb0, Operand::Copy(c.into()), vec![bb1, bb2]);

    b.copy(bb1, p, q);
    increment(&mut b, bb1, x);
    b.goto(bb1, bb3);

    increment(&mut b, bb2, y);
    b.goto(bb2, bb3);

    if read_first {
        b.copy(bb3, z, Place::from_local(p).deref());
        increment(&mut b, bb3, y);
    } else {
        increment(&mut b, bb3, y);
        b.copy(bb3, z, Place::from_local(p).deref());
    }
    b.ret(bb3);
    b.finish()
}

/// ```text
/// let p = &mut s.a;
/// s.b = 1;          // accepted (s.a = 1 when `same_field`: rejected)
/// *p = 2;
/// ```
pub fn field_write(same_field: bool) -> MirResult<Body> {
    let name = if same_field {
        "overlapping_fields"
    } else {
        "disjoint_fields"
    };
    let mut b = BodyBuilder::new(name);
    let borrow = b.origin("0");
    let pair = b.struct_ty("Pair", &[("a", Ty::Int), ("b", Ty::Int)]);
    let s = b.local("s", pair);
    let p = b.local("p", Ty::mut_ref(borrow, Ty::Int));

    let bb0 = b.block();
    let borrowed = b.field(s, "a");
    let written = b.field(s, if same_field { "a" } else { "b" });
    b.borrow(bb0, p, borrow, BorrowKind::Mutable, borrowed);
    b.assign_const(bb0, written, 1);
    b.assign_const(bb0, Place::from_local(p).deref(), 2);
    b.ret(bb0);
    b.finish()
}

/// ```text
/// let p = &x;
/// loop {
///     let z = *p;
///     if !c { break }
///     y += 1;       // accepted: the loan of `y` from the last iteration is dead
///     p = &y;
/// }
/// x += 1;
/// ```
pub fn loop_reborrow() -> MirResult<Body> {
    let mut b = BodyBuilder::new("loop_reborrow");
    let p_origin = b.origin("p");
    let borrow_x = b.origin("0");
    let borrow_y = b.origin("1");

    let c = b.local("c", Ty::Bool);
    let x = b.local("x", Ty::Int);
    let y = b.local("y", Ty::Int);
    let p = b.local("p", Ty::shared_ref(p_origin, Ty::Int));
    let z = b.local("z", Ty::Int);

    let bb0 = b.block();
    let bb1 = b.block();
    let bb2 = b.block();
    let bb3 = b.block();

    b.borrow(bb0, p, borrow_x, BorrowKind::Shared, x);
    b.goto(bb0, bb1);

    b.copy(bb1, z, Place::from_local(p).deref());
    b.switch(bb1, Operand::Copy(c.into()), vec![bb2, bb3]);

    increment(&mut b, bb2, y);
    b.borrow(bb2, p, borrow_y, BorrowKind::Shared, y);
    b.goto(bb2, bb1);

    increment(&mut b, bb3, x);
    b.ret(bb3);
    b.finish()
}

/// ```text
/// fn escaping<'a>() -> &'a int { let x; &x }   // rejected
/// ```
pub fn escaping_borrow() -> MirResult<Body> {
    let mut b = BodyBuilder::new("escaping_borrow");
    let a = b.universal_origin("a");
    let borrow = b.origin("0");
    let x = b.local("x", Ty::Int);
    let ret = b.return_local("ret", Ty::shared_ref(a, Ty::Int));

    let bb0 = b.block();
    b.borrow(bb0, ret, borrow, BorrowKind::Shared, x);
    b.ret(bb0);
    b.finish()
}

/// ```text
/// fn bounded<'a, 'b>(p: &'a int) -> &'b int where 'a: 'b { p }
/// ```
///
/// Accepted with the bound, rejected without it.
pub fn parameter_return(declare_bound: bool) -> MirResult<Body> {
    let name = if declare_bound {
        "bounded_return"
    } else {
        "unbounded_return"
    };
    let mut b = BodyBuilder::new(name);
    let a = b.universal_origin("a");
    let bo = b.universal_origin("b");
    if declare_bound {
        b.known_subset(a, bo);
    }
    let p = b.local("p", Ty::shared_ref(a, Ty::Int));
    let ret = b.return_local("ret", Ty::shared_ref(bo, Ty::Int));

    let bb0 = b.block();
    b.copy(bb0, ret, p);
    b.ret(bb0);
    b.finish()
}

/// ```text
/// let p = &mut x;
/// g(p, x);          // rejected: `x` is read while the call holds `p`
/// ```
pub fn call_with_borrowed_argument() -> MirResult<Body> {
    let mut b = BodyBuilder::new("call_with_borrowed_argument");
    let p_origin = b.origin("p");
    let borrow = b.origin("0");
    let param = b.origin("g");
    let g = FnSig {
        inputs: vec![Ty::mut_ref(param, Ty::Int), Ty::Int],
        output: Ty::Unit,
    };

    let x = b.local("x", Ty::Int);
    let p = b.local("p", Ty::mut_ref(p_origin, Ty::Int));
    let done = b.local("done", Ty::Unit);

    let bb0 = b.block();
    let bb1 = b.block();
    b.assign_const(bb0, x, 0);
    b.borrow(bb0, p, borrow, BorrowKind::Mutable, x);
    let args = vec![Operand::Move(p.into()), Operand::Copy(x.into())];
    b.call(bb0, "g", g, args, done, Some(bb1));
    b.ret(bb1);
    b.finish()
}

/// ```text
/// let p = &mut x;
/// *p = x;           // rejected: `x` is read before the write through `p`
/// ```
pub fn write_through_borrow_of_source() -> MirResult<Body> {
    let mut b = BodyBuilder::new("write_through_borrow_of_source");
    let p_origin = b.origin("p");
    let borrow = b.origin("0");
    let x = b.local("x", Ty::Int);
    let p = b.local("p", Ty::mut_ref(p_origin, Ty::Int));

    let bb0 = b.block();
    b.assign_const(bb0, x, 0);
    b.borrow(bb0, p, borrow, BorrowKind::Mutable, x);
    b.copy(bb0, Place::from_local(p).deref(), x);
    b.ret(bb0);
    b.finish()
}

/// ```text
/// fn reborrow<'a>(x: &'a mut int) -> &'a int { &*x }   // accepted
/// ```
pub fn reborrow_parameter() -> MirResult<Body> {
    let mut b = BodyBuilder::new("reborrow_parameter");
    let a = b.universal_origin("a");
    let borrow = b.origin("0");
    let x = b.local("x", Ty::mut_ref(a, Ty::Int));
    let ret = b.return_local("ret", Ty::shared_ref(a, Ty::Int));

    let bb0 = b.block();
    b.borrow(bb0, ret, borrow, BorrowKind::Shared, Place::from_local(x).deref());
    b.ret(bb0);
    b.finish()
}

/// Every program above, in a fixed order.
///
/// # Errors
///
/// Returns an error if any program fails validation.
pub fn all() -> MirResult<Vec<Body>> {
    Ok(vec![
        vec_push()?,
        two_branch()?,
        join_scenario(true)?,
        join_scenario(false)?,
        field_write(false)?,
        field_write(true)?,
        loop_reborrow()?,
        escaping_borrow()?,
        parameter_return(true)?,
        parameter_return(false)?,
    ])
}
