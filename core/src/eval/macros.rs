//! Small helpers shared by the per-category eval modules.

/// Pop one value, compute, push the result, continue to the next opcode.
macro_rules! op1_u256_fn {
    ( $machine:expr, $op:path ) => {{
        pop_u256!($machine, op1);
        let ret = $op(op1);
        push_u256!($machine, ret);
        Control::Continue(1)
    }};
}

/// Pop two values, compute, push the result, continue to the next opcode.
macro_rules! op2_u256_fn {
    ( $machine:expr, $op:path ) => {{
        pop_u256!($machine, op1, op2);
        let ret = $op(op1, op2);
        push_u256!($machine, ret);
        Control::Continue(1)
    }};
}

/// Pop three values, compute, push the result, continue to the next opcode.
macro_rules! op3_u256_fn {
    ( $machine:expr, $op:path ) => {{
        pop_u256!($machine, op1, op2, op3);
        let ret = $op(op1, op2, op3);
        push_u256!($machine, ret);
        Control::Continue(1)
    }};
}

/// Pop two values, compute a bool, push it as 0/1, continue.
macro_rules! op2_u256_bool_ref {
    ( $machine:expr, $op:path ) => {{
        pop_u256!($machine, op1, op2);
        let ret = $op(&op1, &op2);
        push_u256!($machine, if ret { primitive_types::U256::one() } else { primitive_types::U256::zero() });
        Control::Continue(1)
    }};
}

macro_rules! pop_u256 {
    ( $machine:expr, $( $x:ident ),* ) => {
        $(
            let $x = match $machine.stack_mut().pop() {
                Ok(value) => value,
                Err(e) => return Control::Exit(e.into()),
            };
        )*
    };
}

macro_rules! push_u256 {
    ( $machine:expr, $( $x:expr ),* ) => {
        $(
            match $machine.stack_mut().push($x) {
                Ok(()) => (),
                Err(e) => return Control::Exit(e.into()),
            }
        )*
    };
}

macro_rules! try_or_fail {
    ( $e:expr ) => {
        match $e {
            Ok(v) => v,
            Err(e) => return Control::Exit(e.into()),
        }
    };
}

pub(crate) use {op1_u256_fn, op2_u256_bool_ref, op2_u256_fn, op3_u256_fn, pop_u256, push_u256, try_or_fail};
