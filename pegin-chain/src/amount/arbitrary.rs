//! Randomised test case generation for amounts.

use proptest::prelude::*;

use super::*;

impl<C> Arbitrary for Amount<C>
where
    C: Constraint + 'static,
{
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        C::valid_range()
            .prop_map(|sats| {
                sats.try_into()
                    .expect("values in the valid range are valid amounts")
            })
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}
