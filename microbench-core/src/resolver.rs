//! Name-Based Resolution
//!
//! Turns `(location, member, arguments)` into a zero-argument closure the
//! runner can time. [`Registry`] is the built-in [`Resolver`]: locations map to
//! default-constructible host types, members to typed closures over them.
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry
//!     .location::<Strings>("demo.Strings")
//!     .member("concatenation", |s: &mut Strings, count: u32, len: u32| s.concat(count, len))
//!     .member("calibrated", |_: &mut Strings| std::thread::sleep(Duration::from_millis(111)));
//! ```
//!
//! Binaries can also submit locations at link time with [`LocationDef`] and
//! build the registry with [`Registry::discover`].

use crate::error::{InvocationError, ResolutionError};
use crate::value::{ArgKind, ArgValue, FromArg, format_shape, shape_of};
use fxhash::FxHashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

/// A resolved benchmark target with its arguments already bound
pub type Invocable = Box<dyn FnMut() -> Result<(), InvocationError>>;

/// Member closure bound to its arguments, still waiting for a host instance
pub type Bound<T> = Box<dyn FnMut(&mut T) -> Result<(), InvocationError>>;

/// Maps an identifier's location and member name onto an invocable target
pub trait Resolver {
    /// Resolve `location.member` for the given arguments.
    ///
    /// Every call hands out a fresh target; state inside it is dropped with
    /// the returned closure.
    fn resolve(
        &self,
        location: &str,
        member: &str,
        args: &[ArgValue],
    ) -> Result<Invocable, ResolutionError>;

    /// Locations this resolver can serve, for listings. Empty if unknown.
    fn known_locations(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(
        &self,
        location: &str,
        member: &str,
        args: &[ArgValue],
    ) -> Result<Invocable, ResolutionError> {
        (**self).resolve(location, member, args)
    }

    fn known_locations(&self) -> Vec<String> {
        (**self).known_locations()
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(
        &self,
        location: &str,
        member: &str,
        args: &[ArgValue],
    ) -> Result<Invocable, ResolutionError> {
        (**self).resolve(location, member, args)
    }

    fn known_locations(&self) -> Vec<String> {
        (**self).known_locations()
    }
}

/// Return types a member closure may have
pub trait Outcome {
    /// Discard the value, keeping only success or failure
    fn into_outcome(self) -> Result<(), InvocationError>;
}

impl Outcome for () {
    #[inline]
    fn into_outcome(self) -> Result<(), InvocationError> {
        Ok(())
    }
}

impl<T, E: Display> Outcome for Result<T, E> {
    #[inline]
    fn into_outcome(self) -> Result<(), InvocationError> {
        match self {
            Ok(value) => {
                std::hint::black_box(value);
                Ok(())
            }
            Err(e) => Err(InvocationError::Failed(e.to_string())),
        }
    }
}

/// A closure usable as a member of host type `T`.
///
/// Implemented for `Fn(&mut T, A1, .., An) -> R` with up to four parameters,
/// each decodable through [`FromArg`]. `Args` is a marker (`fn(A1, ..) -> R`)
/// that keeps the arities apart.
pub trait Member<T, Args>: 'static {
    /// Parameter kinds, in order
    fn shape(&self) -> Vec<ArgKind>;

    /// Decode `args` and capture them, or `None` if they do not fit
    fn bind(self: Arc<Self>, args: &[ArgValue]) -> Option<Bound<T>>;
}

macro_rules! impl_member {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<T, F, R, $($ty,)*> Member<T, fn($($ty),*) -> R> for F
        where
            T: 'static,
            F: Fn(&mut T, $($ty),*) -> R + 'static,
            R: Outcome,
            $($ty: FromArg + Clone + 'static,)*
        {
            fn shape(&self) -> Vec<ArgKind> {
                vec![$(<$ty as FromArg>::KIND),*]
            }

            fn bind(self: Arc<Self>, args: &[ArgValue]) -> Option<Bound<T>> {
                let mut _values = args.iter();
                $(let $ty = <$ty as FromArg>::from_arg(_values.next()?)?;)*
                if _values.next().is_some() {
                    return None;
                }
                Some(Box::new(move |target: &mut T| {
                    (*self)(target, $($ty.clone()),*).into_outcome()
                }))
            }
        }
    };
}

impl_member!();
impl_member!(A1);
impl_member!(A1, A2);
impl_member!(A1, A2, A3);
impl_member!(A1, A2, A3, A4);

/// One callable signature of a member
struct Overload {
    shape: Vec<ArgKind>,
    bind: Box<dyn Fn(&[ArgValue]) -> Option<Invocable>>,
}

/// Members registered under one location
#[derive(Default)]
struct Location {
    members: FxHashMap<String, Vec<Overload>>,
}

/// Explicit registry of named closures, standing in for runtime reflection
#[derive(Default)]
pub struct Registry {
    locations: FxHashMap<String, Location>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every [`LocationDef`] submitted with `inventory::submit!`
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for def in inventory::iter::<LocationDef> {
            tracing::debug!(location = def.path, "installing location");
            (def.install)(&mut registry);
        }
        registry
    }

    /// Start (or continue) registering members of `path`, hosted by `T`.
    ///
    /// A fresh `T::default()` is created every time one of its members is
    /// resolved.
    pub fn location<T: Default + 'static>(
        &mut self,
        path: impl Into<String>,
    ) -> LocationBuilder<'_, T> {
        LocationBuilder {
            location: self.locations.entry(path.into()).or_default(),
            _host: PhantomData,
        }
    }

    /// Known locations, sorted
    pub fn locations(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.locations.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Member names of a location, sorted
    pub fn members(&self, location: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .locations
            .get(location)
            .map(|l| l.members.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

impl Resolver for Registry {
    fn resolve(
        &self,
        location: &str,
        member: &str,
        args: &[ArgValue],
    ) -> Result<Invocable, ResolutionError> {
        let host = self
            .locations
            .get(location)
            .ok_or_else(|| ResolutionError::UnknownLocation(location.to_string()))?;

        let overloads = host
            .members
            .get(member)
            .ok_or_else(|| ResolutionError::UnknownMember {
                location: location.to_string(),
                member: member.to_string(),
            })?;

        let shape = shape_of(args);
        let mismatch = || ResolutionError::ShapeMismatch {
            location: location.to_string(),
            member: member.to_string(),
            given: format_shape(&shape),
            accepted: overloads
                .iter()
                .map(|o| format_shape(&o.shape))
                .collect::<Vec<_>>()
                .join(", "),
        };

        let overload = overloads
            .iter()
            .find(|o| o.shape == shape)
            .ok_or_else(mismatch)?;

        // Shape matched but a value may still be out of range for its type
        (overload.bind)(args).ok_or_else(mismatch)
    }

    fn known_locations(&self) -> Vec<String> {
        self.locations().into_iter().map(str::to_string).collect()
    }
}

/// Builder returned by [`Registry::location`]
pub struct LocationBuilder<'r, T> {
    location: &'r mut Location,
    _host: PhantomData<fn() -> T>,
}

impl<T: Default + 'static> LocationBuilder<'_, T> {
    /// Register `handler` as an overload of `name`.
    ///
    /// An overload with the same shape replaces the previous one.
    pub fn member<Args, F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Member<T, Args>,
    {
        let shape = handler.shape();
        let handler = Arc::new(handler);
        let bind = move |args: &[ArgValue]| -> Option<Invocable> {
            let mut call = Arc::clone(&handler).bind(args)?;
            let mut instance = T::default();
            Some(Box::new(move || call(&mut instance)))
        };

        let overloads = self.location.members.entry(name.into()).or_default();
        overloads.retain(|o| o.shape != shape);
        overloads.push(Overload {
            shape,
            bind: Box::new(bind),
        });
        self
    }
}

/// Link-time registration of a location, collected by [`Registry::discover`].
///
/// ```ignore
/// fn install(registry: &mut Registry) {
///     registry.location::<Strings>("demo.Strings").member("calibrated", |_: &mut Strings| ());
/// }
///
/// inventory::submit! { LocationDef::new("demo.Strings", install) }
/// ```
#[derive(Clone, Copy)]
pub struct LocationDef {
    /// Location path, for diagnostics
    pub path: &'static str,
    /// Registers the location's members
    pub install: fn(&mut Registry),
}

impl LocationDef {
    /// Create a definition (usable in `inventory::submit!`)
    pub const fn new(path: &'static str, install: fn(&mut Registry)) -> Self {
        Self { path, install }
    }
}

inventory::collect!(LocationDef);
