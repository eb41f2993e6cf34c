//! Expression evaluation: names, operators, assignment and indexing.

use hybris_ir::{AssignOp, BinaryOp, Node, NodeKind, NodeRef, Span, UnaryOp};
use hybris_value::{
    invalid_assignment, ops, undeclared_identifier, EvalResult, Kind, MapValue, Object, Value,
};

use super::Interpreter;
use crate::frame::Frame;

impl Interpreter {
    /// Resolve a name: named constants, the current frame, the global
    /// frame, type descriptors, then functions (as an alias value).
    pub(crate) fn identifier(&mut self, frame: &Frame, name: &str) -> EvalResult<Object> {
        if let Some(constant) = self.runtime.constant(name) {
            return Ok(constant);
        }
        if let Some(value) = frame.get(name) {
            return Ok(value);
        }
        let global = self.runtime.global();
        if !global.ptr_eq(frame) {
            if let Some(value) = global.get(name) {
                return Ok(value);
            }
        }
        if let Some(descriptor) = self.runtime.type_descriptor(name) {
            return Ok(descriptor);
        }
        if let Some(decl) = self.runtime.function(name) {
            return Ok(self.heap().alloc(Value::Alias(decl)));
        }
        Err(undeclared_identifier(name))
    }

    pub(crate) fn vector_literal(
        &mut self,
        frame: &Frame,
        items: &[NodeRef],
    ) -> EvalResult<Object> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let Some(value) = self.operand(frame, item)? else {
                return Ok(self.null());
            };
            values.push(ops::clone(self.heap(), &value));
        }
        Ok(self.heap().alloc(Value::Vector(values)))
    }

    /// A later duplicate key overwrites the earlier value.
    pub(crate) fn map_literal(
        &mut self,
        frame: &Frame,
        pairs: &[(NodeRef, NodeRef)],
    ) -> EvalResult<Object> {
        let map = self.heap().alloc(Value::Map(MapValue::new()));
        for (key, value) in pairs {
            let Some(key) = self.operand(frame, key)? else {
                return Ok(self.null());
            };
            let Some(value) = self.operand(frame, value)? else {
                return Ok(self.null());
            };
            ops::map_set(self.heap(), &map, &key, &value)?;
        }
        Ok(map)
    }

    pub(crate) fn binary(
        &mut self,
        frame: &Frame,
        op: BinaryOp,
        lhs: &NodeRef,
        rhs: &NodeRef,
        span: Span,
    ) -> EvalResult<Object> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return self.logical(frame, op, lhs, rhs, span);
        }
        let Some(a) = self.operand(frame, lhs)? else {
            return Ok(self.null());
        };
        let Some(b) = self.operand(frame, rhs)? else {
            return Ok(self.null());
        };
        if let Some(result) = self.overload(frame, &a, op.as_symbol(), vec![b.clone()], span)? {
            return Ok(result);
        }
        ops::binary(self.heap(), op, &a, &b)
    }

    /// `&&` and `||` skip the right operand when the left one decides the
    /// result, unless the left operand is a class instance with an overload.
    fn logical(
        &mut self,
        frame: &Frame,
        op: BinaryOp,
        lhs: &NodeRef,
        rhs: &NodeRef,
        span: Span,
    ) -> EvalResult<Object> {
        let Some(a) = self.operand(frame, lhs)? else {
            return Ok(self.null());
        };
        if ops::deref(&a).kind() == Kind::Class {
            let Some(b) = self.operand(frame, rhs)? else {
                return Ok(self.null());
            };
            return match self.overload(frame, &a, op.as_symbol(), vec![b], span)? {
                Some(result) => Ok(result),
                None => Ok(self.null()),
            };
        }

        let left = ops::to_bool(&a.read());
        let decided = match op {
            BinaryOp::And => (!left).then_some(false),
            _ => left.then_some(true),
        };
        if let Some(result) = decided {
            return Ok(self.heap().alloc(Value::Boolean(result)));
        }
        let Some(b) = self.operand(frame, rhs)? else {
            return Ok(self.null());
        };
        let right = ops::to_bool(&b.read());
        Ok(self.heap().alloc(Value::Boolean(right)))
    }

    pub(crate) fn unary(
        &mut self,
        frame: &Frame,
        op: UnaryOp,
        operand: &NodeRef,
        span: Span,
    ) -> EvalResult<Object> {
        let Some(value) = self.operand(frame, operand)? else {
            return Ok(self.null());
        };
        if let Some(result) = self.overload(frame, &value, op.as_symbol(), Vec::new(), span)? {
            return Ok(result);
        }
        ops::unary(self.heap(), op, &value)
    }

    /// `++x`/`--x` yield the updated target; `x++`/`x--` yield a copy of
    /// the value before the update.
    pub(crate) fn step(
        &mut self,
        frame: &Frame,
        op: UnaryOp,
        target: &NodeRef,
        postfix: bool,
        span: Span,
    ) -> EvalResult<Object> {
        let Some(object) = self.operand(frame, target)? else {
            return Ok(self.null());
        };
        if let Some(result) = self.overload(frame, &object, op.as_symbol(), Vec::new(), span)? {
            return Ok(result);
        }
        let object = ops::deref(&object);
        if postfix {
            let previous = self.heap().alloc(object.snapshot());
            ops::step(op, &object)?;
            Ok(previous)
        } else {
            ops::step(op, &object)?;
            Ok(object)
        }
    }

    pub(crate) fn reference(&mut self, frame: &Frame, inner: &NodeRef) -> EvalResult<Object> {
        let Some(object) = self.operand(frame, inner)? else {
            return Ok(self.null());
        };
        Ok(self.heap().alloc(Value::Reference(ops::deref(&object))))
    }

    pub(crate) fn ternary(
        &mut self,
        frame: &Frame,
        cond: &NodeRef,
        then_branch: &NodeRef,
        else_branch: &NodeRef,
    ) -> EvalResult<Object> {
        let Some(cond) = self.operand(frame, cond)? else {
            return Ok(self.null());
        };
        if ops::to_bool(&cond.read()) {
            self.evaluate(frame, then_branch)
        } else {
            self.evaluate(frame, else_branch)
        }
    }

    // Assignment

    pub(crate) fn assign(
        &mut self,
        frame: &Frame,
        op: AssignOp,
        target: &NodeRef,
        value: &NodeRef,
        span: Span,
    ) -> EvalResult<Object> {
        let AssignOp::Compound(binary) = op else {
            return self.assign_plain(frame, target, value, span);
        };
        let Some(lhs) = self.operand(frame, target)? else {
            return Ok(self.null());
        };
        let Some(rhs) = self.operand(frame, value)? else {
            return Ok(self.null());
        };

        let instance = ops::deref(&lhs);
        if instance.kind() != Kind::Class {
            return ops::inplace(self.heap(), binary, &lhs, &rhs);
        }
        // `op=` overload first, then `op` followed by a store into the target.
        if let Some(result) =
            self.call_method(frame, &instance, op.as_symbol(), vec![rhs.clone()], span)?
        {
            return Ok(result);
        }
        let Some(result) = self.overload(frame, &instance, binary.as_symbol(), vec![rhs], span)?
        else {
            return Ok(self.null());
        };
        if frame.is_interrupted() {
            return Ok(self.null());
        }
        ops::assign(self.heap(), &instance, &result)?;
        Ok(instance)
    }

    fn assign_plain(
        &mut self,
        frame: &Frame,
        target: &Node,
        value: &NodeRef,
        span: Span,
    ) -> EvalResult<Object> {
        match &target.kind {
            NodeKind::Identifier(name) => {
                if target.is_me() {
                    return Err(invalid_assignment("me"));
                }
                let Some(value) = self.operand(frame, value)? else {
                    return Ok(self.null());
                };
                self.bind(frame, name, &value)
            }
            NodeKind::Index { owner, index } => {
                let Some(owner) = self.operand(frame, owner)? else {
                    return Ok(self.null());
                };
                let Some(index) = self.operand(frame, index)? else {
                    return Ok(self.null());
                };
                let Some(value) = self.operand(frame, value)? else {
                    return Ok(self.null());
                };
                let args = vec![index.clone(), value.clone()];
                if let Some(result) = self.overload(frame, &owner, "[]=", args, span)? {
                    return Ok(result);
                }
                ops::set(self.heap(), &owner, &index, &value)
            }
            NodeKind::Member { owner: owner_node, name } => {
                let Some(owner) = self.operand(frame, owner_node)? else {
                    return Ok(self.null());
                };
                let Some(value) = self.operand(frame, value)? else {
                    return Ok(self.null());
                };
                self.check_member_access(owner_node, &owner, name)?;
                ops::set_attribute(self.heap(), &owner, name, &value)
            }
            _ => Err(invalid_assignment(target.label())),
        }
    }

    /// Bind `name`: an existing local wins, then an existing global, else a
    /// new local is created.
    pub(crate) fn bind(&mut self, frame: &Frame, name: &str, value: &Object) -> EvalResult<Object> {
        let global = self.runtime.global();
        if !frame.contains(name) && !global.ptr_eq(frame) && global.contains(name) {
            return global.add(self.runtime.heap(), name, value);
        }
        frame.add(self.runtime.heap(), name, value)
    }

    pub(crate) fn index(
        &mut self,
        frame: &Frame,
        owner: &NodeRef,
        index: &NodeRef,
        span: Span,
    ) -> EvalResult<Object> {
        let Some(owner) = self.operand(frame, owner)? else {
            return Ok(self.null());
        };
        let Some(index) = self.operand(frame, index)? else {
            return Ok(self.null());
        };
        if let Some(result) = self.overload(frame, &owner, "[]", vec![index.clone()], span)? {
            return Ok(result);
        }
        ops::at(self.heap(), &owner, &index)
    }
}
