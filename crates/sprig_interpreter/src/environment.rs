use std::{cell::RefCell, collections::HashMap, rc::Rc};

use sprig_parser::token::Token;

use crate::error::RuntimeError;

/// A table of bindings with at most one outer table.
///
/// Lookups only ever go one hop out: a frame sees its own bindings and those of the environment
/// it was called from, nothing further.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Token>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            store: HashMap::new(),
            outer: None,
        }
    }

    /// Create a new environment that is enclosed by a given outer environment
    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Self {
        Environment {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }

    /// Run `f` on the value bound to `name`, looking in this environment then in the outer one.
    pub fn with<R>(&self, name: &str, f: impl FnOnce(&Token) -> R) -> Option<R> {
        match self.store.get(name) {
            Some(value) => Some(f(value)),
            None => match self.outer {
                Some(ref outer) => outer.borrow().with_local(name, f),
                None => None,
            },
        }
    }

    fn with_local<R>(&self, name: &str, f: impl FnOnce(&Token) -> R) -> Option<R> {
        self.store.get(name).map(f)
    }

    /// Bind a new name in this environment. Existing local names are left untouched.
    pub fn define(&mut self, name: String, value: Token) -> Result<(), RuntimeError> {
        if self.store.contains_key(&name) {
            return Err(RuntimeError::AlreadyDefined(name));
        }

        self.store.insert(name, value);
        Ok(())
    }

    /// Overwrite an existing binding, here or in the outer environment.
    pub fn assign(&mut self, name: String, value: Token) -> Result<(), RuntimeError> {
        if let Some(slot) = self.store.get_mut(&name) {
            *slot = value;
            return Ok(());
        }

        match self.outer {
            Some(ref outer) => outer.borrow_mut().assign_local(name, value),
            None => Err(RuntimeError::IdentifierNotFound(name)),
        }
    }

    fn assign_local(&mut self, name: String, value: Token) -> Result<(), RuntimeError> {
        match self.store.get_mut(&name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::IdentifierNotFound(name)),
        }
    }

    pub fn depth(&self) -> usize {
        match &self.outer {
            // Recursively add the depth
            Some(parent_env) => 1 + parent_env.borrow().depth(),
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;
    use sprig_parser::token::Token;

    use crate::{environment::Environment, error::RuntimeError};

    fn get(env: &Environment, name: &str) -> Option<Token> {
        env.with(name, |value| value.duplicate().unwrap())
    }

    #[test]
    pub fn test_depth() {
        let env1 = Rc::new(RefCell::new(Environment::new()));
        assert_eq!(env1.borrow().depth(), 1);

        let env2 = Rc::new(RefCell::new(Environment::new_enclosed(Rc::clone(&env1))));
        assert_eq!(env1.borrow().depth(), 1);
        assert_eq!(env2.borrow().depth(), 2);

        let env3 = Rc::new(RefCell::new(Environment::new_enclosed(Rc::clone(&env2))));
        assert_eq!(env2.borrow().depth(), 2);
        assert_eq!(env3.borrow().depth(), 3);
    }

    #[test]
    fn test_define_rejects_existing_local() {
        let mut env = Environment::new();
        env.define("x".into(), Token::Integer(5)).unwrap();

        assert_eq!(
            env.define("x".into(), Token::Integer(6)),
            Err(RuntimeError::AlreadyDefined("x".into()))
        );
        assert_eq!(get(&env, "x"), Some(Token::Integer(5)));
    }

    #[test]
    fn test_define_shadows_outer() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer
            .borrow_mut()
            .define("x".into(), Token::Integer(1))
            .unwrap();

        let mut inner = Environment::new_enclosed(Rc::clone(&outer));
        inner.define("x".into(), Token::Integer(2)).unwrap();

        assert_eq!(get(&inner, "x"), Some(Token::Integer(2)));
        assert_eq!(get(&outer.borrow(), "x"), Some(Token::Integer(1)));
    }

    #[test]
    fn test_lookup_is_single_hop() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global
            .borrow_mut()
            .define("g".into(), Token::Integer(1))
            .unwrap();

        let middle = Rc::new(RefCell::new(Environment::new_enclosed(Rc::clone(&global))));
        middle
            .borrow_mut()
            .define("m".into(), Token::Integer(2))
            .unwrap();

        let inner = Environment::new_enclosed(Rc::clone(&middle));

        assert_eq!(get(&inner, "m"), Some(Token::Integer(2)));
        assert_eq!(get(&inner, "g"), None);
        assert_eq!(get(&middle.borrow(), "g"), Some(Token::Integer(1)));
    }

    #[test]
    fn test_assign_is_single_hop() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global
            .borrow_mut()
            .define("g".into(), Token::Integer(1))
            .unwrap();

        let middle = Rc::new(RefCell::new(Environment::new_enclosed(Rc::clone(&global))));
        middle
            .borrow_mut()
            .assign("g".into(), Token::Integer(10))
            .unwrap();
        assert_eq!(get(&global.borrow(), "g"), Some(Token::Integer(10)));

        let mut inner = Environment::new_enclosed(Rc::clone(&middle));
        assert_eq!(
            inner.assign("g".into(), Token::Integer(20)),
            Err(RuntimeError::IdentifierNotFound("g".into()))
        );
        assert_eq!(get(&global.borrow(), "g"), Some(Token::Integer(10)));
    }
}
