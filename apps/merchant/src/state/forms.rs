//! # Form State
//!
//! The redemption and registration forms behind `Arc<Mutex<T>>`.

use std::sync::{Arc, Mutex, MutexGuard};

use aliados_core::redemption::RedemptionForm;
use aliados_core::registration::RegistrationForm;
use aliados_core::RegistrationMethod;

/// Locks `mutex`, recovering the form from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The redemption view's form.
#[derive(Debug, Clone, Default)]
pub struct RedeemState {
    form: Arc<Mutex<RedemptionForm>>,
}

impl RedeemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the form.
    pub fn with_form<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RedemptionForm) -> R,
    {
        let form = lock(&self.form);
        f(&form)
    }

    /// Executes a function with write access to the form.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let intent = redeem.with_form_mut(|form| form.submit(business_id));
    /// ```
    pub fn with_form_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RedemptionForm) -> R,
    {
        let mut form = lock(&self.form);
        f(&mut form)
    }
}

/// A registration view's form. The entry method is fixed per view.
#[derive(Debug, Clone)]
pub struct RegisterState {
    form: Arc<Mutex<RegistrationForm>>,
}

impl RegisterState {
    pub fn new(method: RegistrationMethod) -> Self {
        RegisterState {
            form: Arc::new(Mutex::new(RegistrationForm::new(method))),
        }
    }

    pub fn method(&self) -> RegistrationMethod {
        self.with_form(|form| form.method())
    }

    pub fn with_form<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RegistrationForm) -> R,
    {
        let form = lock(&self.form);
        f(&form)
    }

    pub fn with_form_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RegistrationForm) -> R,
    {
        let mut form = lock(&self.form);
        f(&mut form)
    }
}
