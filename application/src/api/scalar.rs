//! Helpers for defining GraphQL scalars over domain types.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Returns the GraphQL name of the `T` scalar for error messages.
fn name_of<T, S>() -> String
where
    T: GraphQLType<S, TypeInfo = ()>,
    S: ScalarValue,
{
    T::name(&()).unwrap_or("<unnamed>").to_owned()
}

/// Helper type to use in `#[graphql(with = ..)]` attribute of string
/// scalars.
///
/// Uses [`FromStr`]/[`Display`] impls of the `As` domain type to convert the
/// target type to/from a GraphQL string, so the domain validation applies
/// to the API input.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into a scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from a scalar [`Value`].
    ///
    /// # Errors
    ///
    /// If the input value is not a string, or is rejected by the `As` type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{}`: expected string, found: \
                 {input}",
                name_of::<T, S>(),
            )
        })?;
        s.parse::<As>()
            .map_err(|e| {
                format!(
                    "Cannot parse input scalar `{}` from \"{s}\": {e}",
                    name_of::<T, S>(),
                )
            })?
            .try_into()
            .map_err(|e| {
                format!(
                    "Cannot parse input scalar `{}`: {e}",
                    name_of::<T, S>(),
                )
            })
    }

    /// Parses the provided [`ScalarToken`] as a string.
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Helper type to use in `#[graphql(with = ..)]` attribute of integer
/// scalars, like quantities of units.
///
/// Target type must be convertible into [`i32`] and fallibly constructible
/// from it.
#[derive(Debug)]
pub struct Int;

impl Int {
    /// Converts the target type into a scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        T: Copy + Into<i32>,
        S: ScalarValue,
    {
        Value::scalar((*value).into())
    }

    /// Constructs the target type from a scalar [`Value`].
    ///
    /// # Errors
    ///
    /// If the input value is not an integer, or is out of the target type's
    /// range.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        T: TryFrom<i32> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let n = input.as_int_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{}`: expected integer, found: \
                 {input}",
                name_of::<T, S>(),
            )
        })?;
        T::try_from(n).map_err(|_| {
            format!("`{n}` is out of `{}` range", name_of::<T, S>())
        })
    }

    /// Parses the provided [`ScalarToken`] as an integer.
    ///
    /// # Errors
    ///
    /// If the token is not an integer.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <i32 as ParseScalarValue<S>>::from_str(value)
    }
}
