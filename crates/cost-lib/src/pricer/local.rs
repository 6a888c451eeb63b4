//! Offline pricer for the reference serverless vendor
//!
//! Quotes are computed from flat rate cards instead of the vendor's pricing
//! API, so a comparison needs no credentials or network access.

use tracing::debug;

use super::{NodePricer, PlatformKind, PlatformParameter, PlatformPricer, PodPricer, RateTable};
use crate::error::{ConfigError, PricingError};
use crate::models::{CloudNodeSpec, CloudPodSpec, Prices, ResourceVector};
use crate::observability::{CostLogger, CostMetrics};
use crate::tier::{builtin_matcher, MatchOutcome, TierMatch, TierMatcher};

/// Pricer backed by the tier matcher and a [`RateTable`]
#[derive(Clone)]
pub struct LocalPricer {
    matcher: TierMatcher,
    rates: RateTable,
    discount: Option<f64>,
    metrics: CostMetrics,
    logger: CostLogger,
}

impl LocalPricer {
    pub fn new(matcher: TierMatcher) -> Self {
        let logger = CostLogger::new(matcher.catalog().vendor());
        Self {
            matcher,
            rates: RateTable::default(),
            discount: None,
            metrics: CostMetrics::new(),
            logger,
        }
    }

    /// Pricer over the embedded tier data with default rates
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self::new(builtin_matcher()?))
    }

    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    /// Factor applied to every total to fill `discount_price`
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn matcher(&self) -> &TierMatcher {
        &self.matcher
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Tier a serverless pod would be billed at
    pub fn quantize(&self, spec: &CloudPodSpec) -> Result<TierMatch, PricingError> {
        let demand = spec.serverless_demand();
        ensure_finite(&demand)?;
        Ok(self
            .matcher
            .match_demand(&demand, spec.forced_charge_type(), spec.machine_arch))
    }

    fn prices_from_cents(&self, cents: u64) -> Prices {
        self.prices(cents as f64 / 100.0)
    }

    fn prices(&self, total_price: f64) -> Prices {
        Prices {
            total_price,
            discount_price: self.discount.map(|d| total_price * d),
        }
    }
}

fn ensure_finite(demand: &ResourceVector) -> Result<(), PricingError> {
    if demand.cpu.is_nan() || demand.mem.is_nan() || demand.gpu.is_nan() {
        return Err(PricingError::NotANumber);
    }
    if !(demand.cpu.is_finite() && demand.mem.is_finite() && demand.gpu.is_finite()) {
        return Err(PricingError::Unavailable(format!(
            "non-finite demand cpu={} mem={} gpu={}",
            demand.cpu, demand.mem, demand.gpu
        )));
    }
    Ok(())
}

impl NodePricer for LocalPricer {
    fn node_price(&self, spec: &CloudNodeSpec) -> Result<Prices, PricingError> {
        if spec.virtual_node {
            return Ok(Prices::zero());
        }
        if let Some(quote) = &spec.quoted_price {
            let quoted = Prices::parse(quote, None)?;
            return Ok(self.prices(quoted.total_price));
        }
        let capacity = ResourceVector::new(spec.cpu, spec.mem).with_gpu(spec.gpu);
        ensure_finite(&capacity)?;
        let cents = self
            .rates
            .node
            .quote_cents(capacity.cpu, capacity.mem, capacity.gpu, 1);
        Ok(self.prices_from_cents(cents))
    }
}

impl PodPricer for LocalPricer {
    fn pod_price(&self, spec: &CloudPodSpec) -> Result<Prices, PricingError> {
        let request = spec.request();
        ensure_finite(&request)?;
        let cents = self
            .rates
            .node
            .quote_cents(request.cpu, request.mem, request.gpu, spec.goods_num);
        Ok(self.prices_from_cents(cents))
    }

    fn serverless_pod_price(&self, spec: &CloudPodSpec) -> Result<Prices, PricingError> {
        let matched = self.quantize(spec)?;
        self.metrics.inc_tier_outcome(matched.outcome.as_str());

        if matched.outcome == MatchOutcome::Ceiling {
            let demand = spec.serverless_demand();
            self.logger.log_tier_saturated(
                matched.architecture.as_str(),
                matched.charge_type.as_str(),
                demand.cpu,
                demand.mem,
                matched.tier.cpu,
                matched.tier.mem,
            );
        }

        let card = self.rates.card(matched.architecture);
        let cents = card.quote_cents(
            matched.tier.cpu,
            matched.tier.mem,
            matched.tier.gpu,
            spec.goods_num,
        );
        debug!(
            architecture = %matched.architecture,
            charge_type = %matched.charge_type,
            tier_cpu = matched.tier.cpu,
            tier_mem = matched.tier.mem,
            tier_gpu = matched.tier.gpu,
            goods_num = spec.goods_num,
            cents = cents,
            "Quoted serverless pod"
        );
        Ok(self.prices_from_cents(cents))
    }

    fn serverless_tier(&self, spec: &CloudPodSpec) -> Option<TierMatch> {
        self.quantize(spec).ok()
    }
}

impl PlatformPricer for LocalPricer {
    fn platform_price(&self, params: &PlatformParameter) -> Prices {
        match params.platform {
            PlatformKind::Serverless => self.prices(self.rates.serverless_platform_hour),
            PlatformKind::Serverful => {
                self.prices(self.rates.cluster_levels.fee(params.resolved_level()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Architecture, ChargeType};
    use crate::pricer::{ClusterLevel, RateCard};

    fn pricer() -> LocalPricer {
        LocalPricer::builtin().unwrap()
    }

    fn pod(cpu: f64, mem: f64) -> CloudPodSpec {
        CloudPodSpec {
            cpu,
            mem,
            ..Default::default()
        }
    }

    #[test]
    fn test_serverless_price_uses_quantized_tier() {
        let rates = RateTable {
            intel: RateCard::new(0.125, 0.0625, 0.0),
            ..Default::default()
        };
        let pricer = pricer().with_rates(rates);

        // (0.3, 0.7) quantizes to the postpaid (0.5, 1) tier: 0.0625 + 0.0625 = 12.5 cents
        let prices = pricer.serverless_pod_price(&pod(0.3, 0.7)).unwrap();
        assert_eq!(prices.total_price, 0.12);

        // (1, 3.5) prepaid quantizes to (1, 4): 0.125 + 0.25 = 37.5 cents
        let prices = pricer.serverless_pod_price(&pod(1.0, 3.5)).unwrap();
        assert_eq!(prices.total_price, 0.37);
    }

    #[test]
    fn test_replicas_multiply_truncated_price() {
        let rates = RateTable {
            intel: RateCard::new(0.125, 0.0625, 0.0),
            ..Default::default()
        };
        let pricer = pricer().with_rates(rates);
        let spec = CloudPodSpec {
            goods_num: 4,
            ..pod(1.0, 3.5)
        };
        assert_eq!(pricer.serverless_pod_price(&spec).unwrap().total_price, 1.48);
    }

    #[test]
    fn test_zero_replicas_cost_nothing() {
        let spec = CloudPodSpec {
            goods_num: 0,
            ..pod(2.0, 4.0)
        };
        let prices = pricer().serverless_pod_price(&spec).unwrap();
        assert_eq!(prices.total_price, 0.0);
        assert_eq!(prices.per_replica(spec.goods_num), 0.0);
    }

    #[test]
    fn test_limit_raises_serverless_demand() {
        let p = pricer();
        let spec = CloudPodSpec {
            cpu_limit: 4.0,
            mem_limit: 8.0,
            ..pod(1.0, 2.0)
        };
        let matched = p.quantize(&spec).unwrap();
        assert_eq!(matched.tier.cpu, 4.0);
        assert_eq!(matched.tier.mem, 8.0);
    }

    #[test]
    fn test_serverless_tier_explains_quote() {
        let p = pricer();
        let tier = p.serverless_tier(&pod(20.0, 10.0)).unwrap();
        assert_eq!(tier.charge_type, ChargeType::PostpaidByHour);
        assert_eq!(tier.outcome, MatchOutcome::Ceiling);
        assert_eq!((tier.tier.cpu, tier.tier.mem), (16.0, 64.0));
        assert!(p.serverless_tier(&pod(f64::NAN, 1.0)).is_none());
    }

    #[test]
    fn test_forced_charge_type_is_honored() {
        let spec = CloudPodSpec {
            charge_type: Some(ChargeType::PostpaidByHour),
            charge_type_forced: true,
            ..pod(1.0, 3.5)
        };
        let matched = pricer().quantize(&spec).unwrap();
        assert_eq!(matched.charge_type, ChargeType::PostpaidByHour);

        // an unforced hint is ignored
        let spec = CloudPodSpec {
            charge_type_forced: false,
            ..spec
        };
        assert_eq!(pricer().quantize(&spec).unwrap().charge_type, ChargeType::Prepaid);
    }

    #[test]
    fn test_gpu_pod_includes_gpu_rate() {
        let spec = CloudPodSpec {
            machine_arch: Architecture::T4,
            gpu: 1.0,
            ..pod(4.0, 16.0)
        };
        let prices = pricer().serverless_pod_price(&spec).unwrap();
        // billed at the (20, 80, 1) bundle
        let expected = ((0.0868 * 20.0 + 0.0868 * 80.0 + 5.21) * 100.0) as u64 as f64 / 100.0;
        assert_eq!(prices.total_price, expected);
    }

    #[test]
    fn test_nan_limit_is_an_error() {
        let spec = CloudPodSpec {
            mem_limit: f64::NAN,
            ..pod(1.0, 2.0)
        };
        assert!(matches!(pricer().quantize(&spec), Err(PricingError::NotANumber)));
    }

    #[test]
    fn test_nan_demand_is_an_error() {
        let err = pricer().serverless_pod_price(&pod(f64::NAN, 1.0)).unwrap_err();
        assert!(matches!(err, PricingError::NotANumber));
        let err = pricer().pod_price(&pod(1.0, f64::NAN)).unwrap_err();
        assert!(matches!(err, PricingError::NotANumber));
    }

    #[test]
    fn test_pod_price_uses_request() {
        let rates = RateTable {
            node: RateCard::new(0.25, 0.125, 0.0),
            ..Default::default()
        };
        let spec = CloudPodSpec {
            cpu_limit: 8.0,
            ..pod(1.0, 2.0)
        };
        let prices = pricer().with_rates(rates).pod_price(&spec).unwrap();
        assert_eq!(prices.total_price, 0.5);
    }

    #[test]
    fn test_virtual_nodes_are_free() {
        let node = CloudNodeSpec {
            cpu: 8.0,
            mem: 32.0,
            virtual_node: true,
            ..Default::default()
        };
        assert_eq!(pricer().node_price(&node).unwrap(), Prices::zero());

        let node = CloudNodeSpec {
            virtual_node: false,
            ..node
        };
        assert!(pricer().node_price(&node).unwrap().total_price > 0.0);
    }

    #[test]
    fn test_quoted_node_price_overrides_rate_card() {
        let node = CloudNodeSpec {
            cpu: 8.0,
            mem: 32.0,
            quoted_price: Some(" 1.25 ".to_string()),
            ..Default::default()
        };
        let prices = pricer().with_discount(0.8).node_price(&node).unwrap();
        assert_eq!(prices.total_price, 1.25);
        assert_eq!(prices.discount_price, Some(1.0));

        let node = CloudNodeSpec {
            quoted_price: Some("1.25/h".to_string()),
            ..node
        };
        let err = pricer().node_price(&node).unwrap_err();
        assert!(matches!(err, PricingError::MalformedQuantity(_)));
    }

    #[test]
    fn test_platform_price_by_kind() {
        let p = pricer();
        assert_eq!(p.platform_price(&PlatformParameter::serverless()).total_price, 0.0);
        assert_eq!(p.platform_price(&PlatformParameter::serverful(3)).total_price, 0.13);
        let params = PlatformParameter::serverful(3).with_cluster_level(ClusterLevel::L100);
        assert_eq!(p.platform_price(&params).total_price, 0.91);
    }

    #[test]
    fn test_discount_fills_discount_price() {
        let p = pricer().with_discount(0.5);
        let prices = p.platform_price(&PlatformParameter::serverful(3));
        assert_eq!(prices.discount_price, Some(0.065));
    }
}
