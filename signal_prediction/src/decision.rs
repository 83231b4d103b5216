/// Traffic scene states the classifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficState {
    Accident,
    DenseTraffic,
    Fire,
    SparseTraffic,
}

/// Classifier output order: score index `i` belongs to `STATES[i]`.
pub const STATES: [TrafficState; 4] = [
    TrafficState::Accident,
    TrafficState::DenseTraffic,
    TrafficState::Fire,
    TrafficState::SparseTraffic,
];

impl TrafficState {
    pub fn as_label(&self) -> &'static str {
        match self {
            TrafficState::Accident => "accident",
            TrafficState::DenseTraffic => "dense_traffic",
            TrafficState::Fire => "fire",
            TrafficState::SparseTraffic => "sparse_traffic",
        }
    }

    pub fn base_timing_secs(&self) -> u32 {
        match self {
            TrafficState::SparseTraffic => 30,
            TrafficState::DenseTraffic => 60,
            TrafficState::Accident => 90,
            TrafficState::Fire => 120,
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, TrafficState::Accident | TrafficState::Fire)
    }

    pub fn alert_message(&self) -> Option<&'static str> {
        match self {
            TrafficState::Accident => {
                Some("Accident detected, emergency services should be notified")
            }
            TrafficState::Fire => Some("Fire detected, emergency protocols activated"),
            _ => None,
        }
    }
}

/// Softmax scores in classifier output order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities {
    scores: [f32; 4],
}

impl ClassProbabilities {
    pub fn from_scores(scores: Vec<f32>) -> Result<Self, String> {
        if scores.len() != STATES.len() {
            return Err(format!(
                "expected {} class scores, got {}",
                STATES.len(),
                scores.len()
            ));
        }
        let mut buf = [0.0; 4];
        buf.copy_from_slice(&scores);
        Ok(Self { scores: buf })
    }

    /// Predicted state and its probability, by argmax over the scores.
    pub fn top(&self) -> (TrafficState, f32) {
        STATES
            .iter()
            .zip(self.scores.iter())
            .map(|(state, score)| (*state, *score))
            .reduce(|accum, item| if item.1 > accum.1 { item } else { accum })
            .unwrap()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDecision {
    pub traffic_state: TrafficState,
    pub confidence: f32,
    pub timing_seconds: u32,
    pub is_emergency: bool,
}

/// Signal timing is the state's base duration damped by classifier
/// confidence, truncated to whole seconds. There is no minimum floor: a
/// near-zero confidence yields a near-zero timing, even for emergencies.
pub fn decide(traffic_state: TrafficState, confidence: f32) -> SignalDecision {
    let timing_seconds = (traffic_state.base_timing_secs() as f32 * confidence) as u32;

    SignalDecision {
        traffic_state,
        confidence,
        timing_seconds,
        is_emergency: traffic_state.is_emergency(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_confidence_is_identity_on_base_table() {
        for state in STATES {
            assert_eq!(decide(state, 1.0).timing_seconds, state.base_timing_secs());
        }
    }

    #[test]
    fn test_zero_confidence_yields_zero_timing() {
        for state in STATES {
            assert_eq!(decide(state, 0.0).timing_seconds, 0);
        }
    }

    #[test]
    fn test_emergency_flag_is_independent_of_confidence() {
        for confidence in [0.01, 0.4, 0.99] {
            assert!(decide(TrafficState::Accident, confidence).is_emergency);
            assert!(decide(TrafficState::Fire, confidence).is_emergency);
            assert!(!decide(TrafficState::DenseTraffic, confidence).is_emergency);
            assert!(!decide(TrafficState::SparseTraffic, confidence).is_emergency);
        }
    }

    #[test]
    fn test_score_index_maps_to_fixed_label_order() {
        let labels: Vec<&str> = STATES.iter().map(|state| state.as_label()).collect();
        assert_eq!(
            labels,
            vec!["accident", "dense_traffic", "fire", "sparse_traffic"]
        );

        let probabilities = ClassProbabilities::from_scores(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let (state, confidence) = probabilities.top();
        assert_eq!(state, TrafficState::SparseTraffic);
        assert_eq!(confidence, 0.4);
    }

    #[test]
    fn test_accident_scenario() {
        let probabilities =
            ClassProbabilities::from_scores(vec![0.85, 0.05, 0.05, 0.05]).unwrap();
        let (state, confidence) = probabilities.top();
        assert_eq!(state, TrafficState::Accident);
        assert_eq!(confidence, 0.85);

        let decision = decide(state, confidence);
        assert_eq!(decision.timing_seconds, 76);
        assert!(decision.is_emergency);
        assert!(state.alert_message().is_some());
    }

    #[test]
    fn test_sparse_scenario() {
        let probabilities = ClassProbabilities::from_scores(vec![0.1, 0.1, 0.1, 0.7]).unwrap();
        let (state, confidence) = probabilities.top();
        assert_eq!(state, TrafficState::SparseTraffic);
        assert_eq!(confidence, 0.7);

        let decision = decide(state, confidence);
        assert_eq!(decision.timing_seconds, 21);
        assert!(!decision.is_emergency);
        assert!(state.alert_message().is_none());
    }

    #[test]
    fn test_damping_can_invert_class_ordering() {
        // A hesitant fire call runs shorter than a confident dense-traffic one.
        let low_confidence_fire = decide(TrafficState::Fire, 0.4);
        let confident_dense = decide(TrafficState::DenseTraffic, 0.9);
        assert_eq!(low_confidence_fire.timing_seconds, 48);
        assert_eq!(confident_dense.timing_seconds, 54);
        assert!(low_confidence_fire.timing_seconds < confident_dense.timing_seconds);
    }

    #[test]
    fn test_from_scores_rejects_wrong_length() {
        assert!(ClassProbabilities::from_scores(vec![0.5, 0.5]).is_err());
        assert!(ClassProbabilities::from_scores(vec![0.2; 5]).is_err());
    }
}
