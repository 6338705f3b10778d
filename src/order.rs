use crate::Result;
use crate::client::KrakenClient;
use crate::error::Error;
use crate::types::{Decimal, MarketOrder, OrderResult, VOLUME_SCALE, format_volume};

/// Volume bought by `fiat_amount` at `price`, truncated to [`VOLUME_SCALE`] places.
///
/// Fails with [`crate::Kind::InvalidVolume`] unless the result is positive.
pub fn volume_for(fiat_amount: Decimal, price: Decimal) -> Result<Decimal> {
    if price <= Decimal::ZERO {
        return Err(Error::invalid_volume(fiat_amount, price, Decimal::ZERO));
    }

    let volume = fiat_amount
        .checked_div(price)
        .map(|v| v.trunc_with_scale(VOLUME_SCALE))
        .unwrap_or(Decimal::ZERO);
    if volume <= Decimal::ZERO {
        return Err(Error::invalid_volume(fiat_amount, price, volume));
    }

    Ok(volume)
}

impl KrakenClient {
    /// Buys `pair` at market for `fiat_amount` of the quote currency.
    ///
    /// The volume is derived from the current best ask. Nothing is sent when it rounds to zero.
    pub async fn buy_with_fiat(
        &self,
        pair: &str,
        fiat_amount: Decimal,
        validate: bool,
    ) -> Result<OrderResult> {
        let price = self.ask_price(pair).await?;
        let volume = volume_for(fiat_amount, price)?;

        tracing::info!(
            pair,
            %price,
            %fiat_amount,
            volume = %format_volume(volume),
            validate,
            "placing market buy"
        );

        let order = MarketOrder::builder()
            .pair(pair)
            .volume(volume)
            .validate(validate)
            .build();
        self.add_order(&order).await
    }

    /// Submits `order` to `AddOrder` and returns the exchange's result unmodified.
    pub async fn add_order(&self, order: &MarketOrder) -> Result<OrderResult> {
        if order.volume <= Decimal::ZERO {
            return Err(Error::invalid_volume(
                Decimal::ZERO,
                Decimal::ZERO,
                order.volume,
            ));
        }

        let result: OrderResult = self.private_call("AddOrder", &order.params()).await?;
        tracing::info!(pair = %order.pair, txid = ?result.txid, descr = %result.descr.order, "order accepted");

        Ok(result)
    }
}
