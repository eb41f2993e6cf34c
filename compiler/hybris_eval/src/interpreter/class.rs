//! User types: declarations, member access, methods and overloads.
//!
//! Class descriptors are flattened when declared: inherited attributes and
//! methods are copied into the descriptor, so lookups never walk a base
//! chain at run time.

use std::sync::Arc;

use hybris_ir::{
    Access, ClassDecl, ClassMember, FunctionDecl, MethodDecl, Node, NodeRef, Span, StructDecl,
};
use hybris_value::{
    duplicate_function, duplicate_type, illegal_access, missing_overload, ops, undeclared_type,
    undefined_attribute, undefined_method, unsupported_operation, Attribute, ClassValue,
    EvalResult, Kind, MethodTable, Object, Overloads, StructValue, Value,
};
use rustc_hash::FxHashMap;

use super::call::{check_arity, Invocation};
use super::Interpreter;
use crate::frame::Frame;

/// Called with the attribute name when a missing attribute is read.
pub(crate) const ATTRIBUTE_HOOK: &str = "__attribute";
/// Called with the method name and a vector of arguments when a missing
/// method is called.
pub(crate) const METHOD_HOOK: &str = "__method";
/// Produces the display form of an instance.
pub(crate) const TO_STRING_HOOK: &str = "__to_string";

impl Interpreter {
    // Declarations

    pub(crate) fn declare_function(&mut self, decl: &Arc<FunctionDecl>) -> EvalResult<Object> {
        if self.runtime.builtins().contains(&decl.name)
            || !self.runtime.define_function(Arc::clone(decl))
        {
            return Err(duplicate_function(&decl.name));
        }
        tracing::debug!(function = %decl.name, arity = decl.params.arity(), "declared function");
        Ok(self.null())
    }

    pub(crate) fn declare_struct(&mut self, decl: &StructDecl) -> EvalResult<Object> {
        let heap = self.runtime.heap();
        let attributes = decl
            .attributes
            .iter()
            .map(|name| Attribute::public(name.clone(), heap.alloc(Value::Integer(0))))
            .collect();
        let descriptor = heap.constant(Value::Struct(StructValue {
            name: decl.name.clone(),
            attributes,
        }));
        if !self.runtime.define_type(&decl.name, descriptor) {
            return Err(duplicate_type(&decl.name));
        }
        tracing::debug!(r#type = %decl.name, "declared struct");
        Ok(self.null())
    }

    /// Flatten a class: base attributes and methods in declaration order
    /// (later bases overwrite earlier ones), then the class's own members.
    /// Static attributes stay shared with the base; others are copied.
    pub(crate) fn declare_class(&mut self, frame: &Frame, decl: &ClassDecl) -> EvalResult<Object> {
        if self.runtime.has_type(&decl.name) {
            return Err(duplicate_type(&decl.name));
        }
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut methods = MethodTable::new();

        for base in &decl.extends {
            let descriptor = self
                .runtime
                .type_descriptor(base)
                .ok_or_else(|| undeclared_type(base))?;
            let guard = descriptor.read();
            for attr in guard.attributes().unwrap_or_default() {
                let value = if attr.is_static {
                    attr.value.clone()
                } else {
                    ops::clone(self.heap(), &attr.value)
                };
                upsert(&mut attributes, Attribute { value, ..attr.clone() });
            }
            if let Some(class) = guard.as_class() {
                methods.merge(&class.methods);
            }
        }

        let mut own: Vec<(String, Overloads)> = Vec::new();
        let mut slots: FxHashMap<&str, usize> = FxHashMap::default();
        for member in &decl.members {
            match member {
                ClassMember::Attribute {
                    name,
                    access,
                    is_static,
                    default,
                } => {
                    let value = match default {
                        Some(node) => {
                            let Some(value) = self.operand(frame, node)? else {
                                return Ok(self.null());
                            };
                            ops::clone(self.heap(), &value)
                        }
                        None => self.heap().alloc(Value::Integer(0)),
                    };
                    upsert(
                        &mut attributes,
                        Attribute {
                            name: name.clone(),
                            value,
                            access: *access,
                            is_static: *is_static,
                        },
                    );
                }
                ClassMember::Method(method) => match slots.get(method.name.as_str()) {
                    Some(&slot) => own[slot].1.push(Arc::clone(method)),
                    None => {
                        slots.insert(&method.name, own.len());
                        let mut overloads = Overloads::new();
                        overloads.push(Arc::clone(method));
                        own.push((method.name.clone(), overloads));
                    }
                },
            }
        }
        for (name, overloads) in own {
            methods.replace(&name, overloads);
        }

        let descriptor = self.heap().constant(Value::Class(ClassValue {
            name: decl.name.clone(),
            attributes,
            methods: Arc::new(methods),
            expiry: None,
        }));
        if !self.runtime.define_type(&decl.name, descriptor) {
            return Err(duplicate_type(&decl.name));
        }
        tracing::debug!(r#type = %decl.name, bases = decl.extends.len(), "declared class");
        Ok(self.null())
    }

    // Members

    /// Non-public members are reachable only through `me`.
    fn check_access(owner: &Node, type_name: &str, member: &str, access: Access) -> EvalResult<()> {
        if access == Access::Public || owner.is_me() {
            Ok(())
        } else {
            Err(illegal_access(type_name, member, access))
        }
    }

    pub(crate) fn check_member_access(
        &self,
        owner_node: &Node,
        owner: &Object,
        name: &str,
    ) -> EvalResult<()> {
        let owner = ops::deref(owner);
        let guard = owner.read();
        let access = guard
            .attributes()
            .and_then(|attrs| attrs.iter().find(|a| a.name == name))
            .map(|a| a.access);
        match access {
            Some(access) => Self::check_access(owner_node, &guard.type_name(), name, access),
            None => Ok(()),
        }
    }

    /// `owner.name`.
    pub(crate) fn member(
        &mut self,
        frame: &Frame,
        owner_node: &NodeRef,
        name: &str,
        span: Span,
    ) -> EvalResult<Object> {
        let Some(owner) = self.operand(frame, owner_node)? else {
            return Ok(self.null());
        };
        let owner = ops::deref(&owner);
        let (type_name, found) = {
            let guard = owner.read();
            let Some(attributes) = guard.attributes() else {
                return Err(unsupported_operation(".", &guard.type_name()));
            };
            let found = attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| (a.value.clone(), a.access));
            (guard.type_name(), found)
        };

        if let Some((value, access)) = found {
            Self::check_access(owner_node, &type_name, name, access)?;
            return Ok(value);
        }
        let key = self.heap().alloc(Value::String(name.to_owned()));
        match self.call_method(frame, &owner, ATTRIBUTE_HOOK, vec![key], span)? {
            Some(value) => Ok(value),
            None => Err(undefined_attribute(&type_name, name)),
        }
    }

    /// `owner.name(args)`.
    ///
    /// Non-class receivers call the builtin of the same name with the
    /// receiver as first argument, so `v.size()` is `size(v)`.
    pub(crate) fn method_call(
        &mut self,
        frame: &Frame,
        owner_node: &NodeRef,
        name: &str,
        args: &[NodeRef],
        span: Span,
    ) -> EvalResult<Object> {
        let Some(owner) = self.operand(frame, owner_node)? else {
            return Ok(self.null());
        };
        let instance = ops::deref(&owner);

        if instance.kind() != Kind::Class {
            let Some(builtin) = self.runtime.builtins().get(name) else {
                return Err(undefined_method(&instance.read().type_name(), name));
            };
            let Some(mut values) = self.arguments(frame, args)? else {
                return Ok(self.null());
            };
            values.insert(0, owner);
            return self.call_builtin(frame, name, builtin, values);
        }

        let (type_name, method) = lookup_method(&instance, name, args.len());
        let Some(method) = method else {
            if !has_method(&instance, name) && has_method(&instance, METHOD_HOOK) {
                let Some(values) = self.arguments(frame, args)? else {
                    return Ok(self.null());
                };
                let heap = self.heap();
                let hook_args = vec![
                    heap.alloc(Value::String(name.to_owned())),
                    heap.alloc(Value::Vector(values)),
                ];
                let result = self.call_method(frame, &instance, METHOD_HOOK, hook_args, span)?;
                if let Some(result) = result {
                    return Ok(result);
                }
            }
            return Err(undefined_method(&type_name, name));
        };

        Self::check_access(owner_node, &type_name, name, method.access)?;
        let qualified = format!("{type_name}.{name}");
        check_arity(&qualified, &method.params, args.len())?;
        let Some(values) = self.arguments(frame, args)? else {
            return Ok(self.null());
        };
        self.invoke(frame, method_invocation(qualified, &method, instance), values, span)
    }

    /// Call method `name` of a class instance with evaluated arguments,
    /// skipping the access check. `None` when `object` is not a class
    /// instance or has no method of that name.
    pub(crate) fn call_method(
        &mut self,
        frame: &Frame,
        object: &Object,
        name: &str,
        values: Vec<Object>,
        span: Span,
    ) -> EvalResult<Option<Object>> {
        let instance = ops::deref(object);
        if instance.kind() != Kind::Class {
            return Ok(None);
        }
        let (type_name, method) = lookup_method(&instance, name, values.len());
        let Some(method) = method else {
            return Ok(None);
        };
        let qualified = format!("{type_name}.{name}");
        check_arity(&qualified, &method.params, values.len())?;
        let invocation = method_invocation(qualified, &method, instance);
        self.invoke(frame, invocation, values, span).map(Some)
    }

    /// Operator `symbol` on a class instance.
    ///
    /// `None` for other receivers, which use the built-in operators; a class
    /// without the overload is an error.
    pub(crate) fn overload(
        &mut self,
        frame: &Frame,
        owner: &Object,
        symbol: &str,
        values: Vec<Object>,
        span: Span,
    ) -> EvalResult<Option<Object>> {
        let instance = ops::deref(owner);
        if instance.kind() != Kind::Class {
            return Ok(None);
        }
        match self.call_method(frame, &instance, symbol, values, span)? {
            Some(result) => Ok(Some(result)),
            None => Err(missing_overload(&instance.read().type_name(), symbol)),
        }
    }
}

fn upsert(attributes: &mut Vec<Attribute>, attribute: Attribute) {
    match attributes.iter_mut().find(|a| a.name == attribute.name) {
        Some(slot) => *slot = attribute,
        None => attributes.push(attribute),
    }
}

fn lookup_method(instance: &Object, name: &str, argc: usize) -> (String, Option<Arc<MethodDecl>>) {
    let guard = instance.read();
    let method = guard
        .as_class()
        .and_then(|class| class.methods.lookup(name, argc).cloned());
    (guard.type_name(), method)
}

fn has_method(instance: &Object, name: &str) -> bool {
    instance
        .read()
        .as_class()
        .is_some_and(|class| class.methods.contains(name))
}

fn method_invocation(name: String, method: &MethodDecl, me: Object) -> Invocation<'_> {
    Invocation {
        name,
        params: &method.params,
        body: &method.body,
        me: Some(me),
    }
}
