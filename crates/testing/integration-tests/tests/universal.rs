//! Universal origins at the function boundary.

use fc_borrowck::BorrowError;
use fc_index::Idx;
use fc_mir::{BasicBlock, Location};
use fc_region::RegionError;
use integration_tests::{errors_of, programs};

#[test]
fn test_returning_a_local_borrow_is_rejected() {
    let body = programs::escaping_borrow().unwrap();
    let errors = errors_of(&body);
    assert_eq!(errors.len(), 1);
    let BorrowError::Region(RegionError::LoanEscapes {
        loan,
        origin,
        location,
        ..
    }) = &errors[0]
    else {
        panic!("expected an escaping loan, got {:?}", errors[0]);
    };
    assert_eq!(loan.to_string(), "L0");
    assert_eq!(origin, "a");
    assert_eq!(*location, Location::new(BasicBlock::new(0), 1));
    assert_eq!(
        errors[0].to_string(),
        "loan L0 escapes into universal origin `'a`"
    );
}

#[test]
fn test_returning_a_parameter_with_a_declared_bound_is_accepted() {
    let body = programs::parameter_return(true).unwrap();
    assert!(errors_of(&body).is_empty());
}

#[test]
fn test_undeclared_universal_flow_is_rejected() {
    let body = programs::parameter_return(false).unwrap();
    let errors = errors_of(&body);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        BorrowError::Region(RegionError::UniversalSubset { sub, sup, .. }) if sub == "a" && sup == "b"
    ));
    assert_eq!(
        errors[0].to_string(),
        "`'a` flows into `'b`, but `'a: 'b` is not declared"
    );
}

#[test]
fn test_reborrowing_through_a_parameter_is_accepted() {
    let body = programs::reborrow_parameter().unwrap();
    assert!(errors_of(&body).is_empty());
}
