//! End-to-end pipeline tests over recorded fixtures and scripted providers.
